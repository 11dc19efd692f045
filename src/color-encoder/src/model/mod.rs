pub mod backbone;
pub mod blocks;
pub mod encoder;
pub mod head;
pub mod inference;
pub mod pretrained;
pub mod resnet;
pub mod training;
pub mod valid;

use crate::error::ColorError;
use std::{fmt, str::FromStr};

/// ResNet variant used as the feature extractor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backbone {
    #[default]
    ResNet34,
    ResNet50,
}

impl Backbone {
    pub fn layers(self) -> [usize; 4] {
        [3, 4, 6, 3]
    }

    /// Channel multiplier of the residual blocks (bottlenecks widen by 4).
    pub fn expansion(self) -> usize {
        match self {
            Backbone::ResNet34 => 1,
            Backbone::ResNet50 => 4,
        }
    }

    pub fn feature_dim(self) -> usize {
        512 * self.expansion()
    }
}

impl FromStr for Backbone {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r34" | "resnet34" => Ok(Backbone::ResNet34),
            "r50" | "resnet50" => Ok(Backbone::ResNet50),
            _ => Err(ColorError::UnknownBackbone(s.to_string())),
        }
    }
}

impl fmt::Display for Backbone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backbone::ResNet34 => f.write_str("R34"),
            Backbone::ResNet50 => f.write_str("R50"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_selectors() {
        assert_eq!("R34".parse::<Backbone>().unwrap(), Backbone::ResNet34);
        assert_eq!("r50".parse::<Backbone>().unwrap(), Backbone::ResNet50);
        assert_eq!(" ResNet50 ".parse::<Backbone>().unwrap(), Backbone::ResNet50);
        assert_eq!(Backbone::ResNet50.to_string().parse::<Backbone>().unwrap(), Backbone::ResNet50);
    }

    #[test]
    fn rejects_unknown_selector() {
        let err = "R101".parse::<Backbone>().unwrap_err();
        assert!(matches!(err, ColorError::UnknownBackbone(ref s) if s == "R101"));
    }

    #[test]
    fn feature_dims() {
        assert_eq!(Backbone::ResNet34.feature_dim(), 512);
        assert_eq!(Backbone::ResNet50.feature_dim(), 2048);
    }
}

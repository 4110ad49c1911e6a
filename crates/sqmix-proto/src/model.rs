//! Console models and mixer object categories.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The SQ console variants this crate knows about.
///
/// All three share the same 48-channel processing core; they differ only in
/// surface controls (softkey count).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Model {
    #[serde(rename = "SQ-5")]
    Sq5,
    #[serde(rename = "SQ-6")]
    Sq6,
    #[serde(rename = "SQ-7")]
    Sq7,
}

/// A class of addressable mixer object.
///
/// LR is a singleton and structurally distinct from [`Category::Mix`] even
/// though the console UI sometimes presents it as a thirteenth mix; the NRPN
/// tables give it its own base rows.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    InputChannel,
    Group,
    Mix,
    Lr,
    FxReturn,
    FxSend,
    Matrix,
    Dca,
    MuteGroup,
    SoftKey,
}

impl Model {
    /// Number of scenes the console stores.
    pub const SCENE_COUNT: u16 = 300;

    /// How many objects of `category` exist on this model.
    pub fn count(self, category: Category) -> u16 {
        match category {
            Category::InputChannel => 48,
            Category::Group => 12,
            Category::Mix => 12,
            Category::Lr => 1,
            Category::FxReturn => 8,
            Category::FxSend => 4,
            Category::Matrix => 3,
            Category::Dca => 8,
            Category::MuteGroup => 8,
            Category::SoftKey => match self {
                Model::Sq5 => 8,
                Model::Sq6 | Model::Sq7 => 16,
            },
        }
    }

    /// Validate a zero-based index against this model's count.
    pub fn check_index(self, category: Category, index: u16) -> Result<()> {
        let count = self.count(category);
        if index < count {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                category,
                index,
                model: self,
                count,
            })
        }
    }

    /// Validate a zero-based scene number.
    pub fn check_scene(self, scene: u16) -> Result<()> {
        if scene < Self::SCENE_COUNT {
            Ok(())
        } else {
            Err(Error::SceneOutOfRange {
                scene,
                count: Self::SCENE_COUNT,
            })
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Model::Sq5 => "SQ-5",
            Model::Sq6 => "SQ-6",
            Model::Sq7 => "SQ-7",
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::InputChannel => "input channel",
            Category::Group => "group",
            Category::Mix => "mix",
            Category::Lr => "LR",
            Category::FxReturn => "FX return",
            Category::FxSend => "FX send",
            Category::Matrix => "matrix",
            Category::Dca => "DCA",
            Category::MuteGroup => "mute group",
            Category::SoftKey => "softkey",
        })
    }
}

impl Category {
    /// Every category, in table order.
    pub const ALL: [Category; 10] = [
        Category::InputChannel,
        Category::Group,
        Category::Mix,
        Category::Lr,
        Category::FxReturn,
        Category::FxSend,
        Category::Matrix,
        Category::Dca,
        Category::MuteGroup,
        Category::SoftKey,
    ];
}

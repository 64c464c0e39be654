use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Educational blurb shown when the user taps a result line.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ClassInfo {
    pub label: &'static str,
    pub description: &'static str,
    pub reference_url: &'static str,
}

/// Info card for the binary malignancy probability.
pub const MALIGNANCY_INFO: ClassInfo = ClassInfo {
    label: "Malignancy",
    description: "This is the probability that the skin condition is harmful or cancerous.",
    reference_url: "https://en.wikipedia.org/wiki/Malignancy",
};

/// The seven lesion types, in fixed display order.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum LesionClass {
    #[strum(serialize = "Melanoma")]
    Melanoma,
    #[strum(serialize = "Basal Cell Carcinoma")]
    BasalCellCarcinoma,
    #[strum(serialize = "Melanocytic Nevus")]
    MelanocyticNevus,
    #[strum(serialize = "Actinic Keratosis")]
    ActinicKeratosis,
    #[strum(serialize = "Benign Keratosis")]
    BenignKeratosis,
    #[strum(serialize = "Vascular Lesion")]
    VascularLesion,
    #[strum(serialize = "Dermatofibroma")]
    Dermatofibroma,
}

impl LesionClass {
    /// All classes in display order. Postprocessing relies on this ordering.
    pub const ALL: [LesionClass; 7] = [
        LesionClass::Melanoma,
        LesionClass::BasalCellCarcinoma,
        LesionClass::MelanocyticNevus,
        LesionClass::ActinicKeratosis,
        LesionClass::BenignKeratosis,
        LesionClass::VascularLesion,
        LesionClass::Dermatofibroma,
    ];

    pub fn info(&self) -> ClassInfo {
        match self {
            LesionClass::Melanoma => ClassInfo {
                label: "Melanoma",
                description: "The most serious type of skin cancer.",
                reference_url: "https://en.wikipedia.org/wiki/Melanoma",
            },
            LesionClass::BasalCellCarcinoma => ClassInfo {
                label: "Basal Cell Carcinoma",
                description: "A type of skin cancer that begins in the basal cells.",
                reference_url: "https://en.wikipedia.org/wiki/Basal-cell_carcinoma",
            },
            LesionClass::MelanocyticNevus => ClassInfo {
                label: "Melanocytic Nevus",
                description: "A usually noncancerous disorder of pigment-producing skin cells \
                              commonly called birth marks or moles.",
                reference_url: "https://en.wikipedia.org/wiki/Melanocytic_nevus",
            },
            LesionClass::ActinicKeratosis => ClassInfo {
                label: "Actinic Keratosis",
                description: "A rough, scaly patch on the skin caused by years of sun exposure.",
                reference_url: "https://en.wikipedia.org/wiki/Actinic_keratosis",
            },
            LesionClass::BenignKeratosis => ClassInfo {
                label: "Benign Keratosis",
                description: "A noncancerous skin condition that appears as a waxy brown, black, \
                              or tan growth.",
                reference_url: "https://en.wikipedia.org/wiki/Seborrheic_keratosis",
            },
            LesionClass::VascularLesion => ClassInfo {
                label: "Vascular Lesions",
                description: "Relatively common abnormalities of the skin and underlying tissues, \
                              more commonly known as birthmarks.",
                reference_url: "https://en.wikipedia.org/wiki/Skin_condition",
            },
            LesionClass::Dermatofibroma => ClassInfo {
                label: "Dermatofibroma",
                description: "A common benign fibrous nodule usually found on the skin of the \
                              lower legs.",
                reference_url: "https://en.wikipedia.org/wiki/Dermatofibroma",
            },
        }
    }
}

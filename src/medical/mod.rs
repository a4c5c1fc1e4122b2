//! Post-processing of generated answers: disease-card extraction and the
//! API response shape.

mod disease_info;
mod response;

pub use disease_info::{extract_disease_info, DiseaseInfo};
pub use response::{truncate_source, MedicalQueryResponse};

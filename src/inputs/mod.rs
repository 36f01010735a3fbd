//! Static reference tables
//!
//! The crawl's input universe is the cross product of three local reference
//! files: a plan table, specialty tables per service type, and a geography
//! list. These are the only files whose absence is fatal at startup -
//! everything downstream degrades instead of aborting.

use crate::config::InputsConfig;
use crate::{HarvestError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

/// One insurance plan from the plan table
#[derive(Debug, Clone, Deserialize)]
pub struct PlanEntry {
    #[serde(rename = "NetworkCode")]
    pub network_code: String,

    #[serde(rename = "LobMctrType")]
    pub lob_mctr_type: i64,

    #[serde(rename = "CoverageType")]
    pub coverage_type: String,
}

impl PlanEntry {
    /// Line-of-business mapping: 1003 is the GHI book, everything else HIP
    pub fn plan_type(&self) -> &'static str {
        if self.lob_mctr_type == 1003 {
            "GHI"
        } else {
            "HIP"
        }
    }

    /// Dental coverage selects the dental specialty table
    pub fn is_dental(&self) -> bool {
        self.coverage_type == "D"
    }
}

/// One specialty row from a specialty table
#[derive(Debug, Clone, Deserialize)]
pub struct SpecialtyEntry {
    pub code: String,

    #[serde(default)]
    pub name: Option<String>,
}

/// One geography row; only the zip is used to key partitions
#[derive(Debug, Clone, Deserialize)]
pub struct GeoInput {
    #[serde(deserialize_with = "zip_from_any")]
    pub zip: String,
}

/// Zip columns arrive as strings or bare numbers depending on the export
fn zip_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ZipRepr {
        Text(String),
        Number(u64),
    }

    Ok(match ZipRepr::deserialize(deserializer)? {
        ZipRepr::Text(s) => s,
        ZipRepr::Number(n) => format!("{:05}", n),
    })
}

/// The full set of reference tables
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub plans: Vec<PlanEntry>,
    pub doctor_specialties: Vec<SpecialtyEntry>,
    pub pcp_specialties: Vec<SpecialtyEntry>,
    pub dental_specialties: Vec<SpecialtyEntry>,
}

/// Loads every reference table named in the configuration
pub fn load_reference_tables(config: &InputsConfig) -> Result<ReferenceTables> {
    Ok(ReferenceTables {
        plans: load_json_table(Path::new(&config.plans_path))?,
        doctor_specialties: load_json_table(Path::new(&config.doctor_specialties_path))?,
        pcp_specialties: load_json_table(Path::new(&config.pcp_specialties_path))?,
        dental_specialties: load_json_table(Path::new(&config.dental_specialties_path))?,
    })
}

/// Loads the geography list
pub fn load_geo_inputs(path: &Path) -> Result<Vec<GeoInput>> {
    load_json_table(path)
}

fn load_json_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|e| HarvestError::Input {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| HarvestError::Input {
        path: path.display().to_string(),
        message: format!("invalid JSON table: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_plan_type_mapping() {
        let ghi = PlanEntry {
            network_code: "G1".to_string(),
            lob_mctr_type: 1003,
            coverage_type: "M".to_string(),
        };
        let hip = PlanEntry {
            network_code: "H1".to_string(),
            lob_mctr_type: 1001,
            coverage_type: "M".to_string(),
        };

        assert_eq!(ghi.plan_type(), "GHI");
        assert_eq!(hip.plan_type(), "HIP");
    }

    #[test]
    fn test_dental_coverage_detection() {
        let dental = PlanEntry {
            network_code: "D1".to_string(),
            lob_mctr_type: 1001,
            coverage_type: "D".to_string(),
        };
        assert!(dental.is_dental());
    }

    #[test]
    fn test_load_plans_table() {
        let file = write_temp(
            r#"[
                { "NetworkCode": "D013", "LobMctrType": 1001, "CoverageType": "M" },
                { "NetworkCode": "G004", "LobMctrType": 1003, "CoverageType": "D" }
            ]"#,
        );

        let plans: Vec<PlanEntry> = load_json_table(file.path()).unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].network_code, "D013");
        assert_eq!(plans[1].plan_type(), "GHI");
    }

    #[test]
    fn test_load_geo_inputs_mixed_zip_types() {
        let file = write_temp(r#"[ { "zip": "10001" }, { "zip": 7302 } ]"#);

        let inputs = load_geo_inputs(file.path()).unwrap();
        assert_eq!(inputs[0].zip, "10001");
        // Numeric zips are left-padded back to five digits
        assert_eq!(inputs[1].zip, "07302");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = load_geo_inputs(Path::new("/nonexistent/uszips.json"));
        assert!(matches!(
            result.unwrap_err(),
            HarvestError::Input { .. }
        ));
    }

    #[test]
    fn test_malformed_table_is_fatal() {
        let file = write_temp("{ not json ]");
        let result: Result<Vec<SpecialtyEntry>> = load_json_table(file.path());
        assert!(result.is_err());
    }
}

//! Partition and page-cursor data model
//!
//! A partition is one independent unit of crawl work: the tuple of geography,
//! plan, and specialty that keys a search. Partitions are immutable once
//! built. The page cursor is the only mutable crawl state and it moves
//! monotonically forward - the total page count is fixed by page 1 and never
//! recomputed.

use crate::inputs::ReferenceTables;

/// Service type of a specialty table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Doctor,
    Pcp,
    Dental,
}

impl ServiceType {
    /// Wire value sent in the search input
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doctor => "Doctor",
            Self::Pcp => "PCP",
            Self::Dental => "Dental",
        }
    }
}

/// One independent crawl unit: geography × plan × specialty
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    pub zip_code: String,
    pub plan_type: String,
    pub network_code: String,
    pub specialty_code: String,
    pub service_type: ServiceType,
    pub distance: String,
}

impl Partition {
    /// Expands one geography row into its full partition set
    ///
    /// Dental-coverage plans search the dental specialty table; every other
    /// plan searches the doctor and primary-care tables.
    pub fn expand(tables: &ReferenceTables, zip_code: &str, distance: &str) -> Vec<Partition> {
        let mut partitions = Vec::new();

        for plan in &tables.plans {
            let specialty_sets: Vec<(ServiceType, &[crate::inputs::SpecialtyEntry])> =
                if plan.is_dental() {
                    vec![(ServiceType::Dental, tables.dental_specialties.as_slice())]
                } else {
                    vec![
                        (ServiceType::Doctor, tables.doctor_specialties.as_slice()),
                        (ServiceType::Pcp, tables.pcp_specialties.as_slice()),
                    ]
                };

            for (service_type, specialties) in specialty_sets {
                for specialty in specialties {
                    partitions.push(Partition {
                        zip_code: zip_code.to_string(),
                        plan_type: plan.plan_type().to_string(),
                        network_code: plan.network_code.clone(),
                        specialty_code: specialty.code.clone(),
                        service_type,
                        distance: distance.to_string(),
                    });
                }
            }
        }

        partitions
    }

    /// Compact identity used in log lines
    pub fn describe(&self) -> String {
        format!(
            "{}/{} {} zip={}",
            self.specialty_code,
            self.service_type.as_str(),
            self.plan_type,
            self.zip_code
        )
    }
}

/// Monotonic page cursor of one partition
///
/// Starts at page 1 with an unknown total; [`PageCursor::record_total`] fixes
/// the total page count from page 1's record count and later calls are
/// ignored.
#[derive(Debug, Clone)]
pub struct PageCursor {
    pub page: u32,
    pub page_size: u32,
    total_pages: Option<u32>,
}

impl PageCursor {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total_pages: None,
        }
    }

    /// Zero-based record offset of the current page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// Total pages; placeholder of 1 until page 1 has reported
    pub fn total_pages(&self) -> u32 {
        self.total_pages.unwrap_or(1)
    }

    /// Fixes the total page count from the first page's record count
    ///
    /// ceil(total_records / page_size); zero records terminate the partition
    /// with zero further pages. Subsequent calls do not change the total.
    pub fn record_total(&mut self, total_records: u64) {
        if self.total_pages.is_some() {
            return;
        }
        let pages = total_records.div_ceil(u64::from(self.page_size));
        self.total_pages = Some(u32::try_from(pages).unwrap_or(u32::MAX));
    }

    /// Advances to the next page
    pub fn advance(&mut self) {
        self.page += 1;
    }

    /// Terminal when the cursor has moved past the last page
    pub fn is_done(&self) -> bool {
        self.page > self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{PlanEntry, SpecialtyEntry};

    fn tables() -> ReferenceTables {
        ReferenceTables {
            plans: vec![
                PlanEntry {
                    network_code: "H1".to_string(),
                    lob_mctr_type: 1001,
                    coverage_type: "M".to_string(),
                },
                PlanEntry {
                    network_code: "D1".to_string(),
                    lob_mctr_type: 1003,
                    coverage_type: "D".to_string(),
                },
            ],
            doctor_specialties: vec![
                SpecialtyEntry {
                    code: "CARD".to_string(),
                    name: Some("Cardiology".to_string()),
                },
                SpecialtyEntry {
                    code: "DERM".to_string(),
                    name: None,
                },
            ],
            pcp_specialties: vec![SpecialtyEntry {
                code: "PCP1".to_string(),
                name: None,
            }],
            dental_specialties: vec![SpecialtyEntry {
                code: "DENT1".to_string(),
                name: None,
            }],
        }
    }

    #[test]
    fn test_expand_cross_product() {
        let partitions = Partition::expand(&tables(), "10001", "50mi");

        // Medical plan: 2 doctor + 1 pcp; dental plan: 1 dental
        assert_eq!(partitions.len(), 4);

        let dental: Vec<_> = partitions
            .iter()
            .filter(|p| p.service_type == ServiceType::Dental)
            .collect();
        assert_eq!(dental.len(), 1);
        assert_eq!(dental[0].plan_type, "GHI");
        assert_eq!(dental[0].network_code, "D1");

        assert!(partitions
            .iter()
            .filter(|p| p.plan_type == "HIP")
            .all(|p| p.service_type != ServiceType::Dental));
    }

    #[test]
    fn test_cursor_initial_state() {
        let cursor = PageCursor::new(50);
        assert_eq!(cursor.page, 1);
        assert_eq!(cursor.offset(), 0);
        assert_eq!(cursor.total_pages(), 1);
        assert!(!cursor.is_done());
    }

    #[test]
    fn test_cursor_total_is_ceiling() {
        let mut cursor = PageCursor::new(50);
        cursor.record_total(120);
        assert_eq!(cursor.total_pages(), 3);

        let mut exact = PageCursor::new(50);
        exact.record_total(100);
        assert_eq!(exact.total_pages(), 2);

        let mut single = PageCursor::new(50);
        single.record_total(1);
        assert_eq!(single.total_pages(), 1);
    }

    #[test]
    fn test_cursor_total_fixed_after_first_report() {
        let mut cursor = PageCursor::new(50);
        cursor.record_total(120);
        cursor.record_total(9999);
        assert_eq!(cursor.total_pages(), 3);
    }

    #[test]
    fn test_cursor_zero_records_terminates() {
        let mut cursor = PageCursor::new(50);
        cursor.record_total(0);
        assert_eq!(cursor.total_pages(), 0);
        assert!(cursor.is_done());
    }

    #[test]
    fn test_cursor_walks_all_pages() {
        let mut cursor = PageCursor::new(50);
        cursor.record_total(120);

        let mut pages = Vec::new();
        while !cursor.is_done() {
            pages.push(cursor.page);
            cursor.advance();
        }
        assert_eq!(pages, vec![1, 2, 3]);
        assert_eq!(cursor.offset(), 150);
    }
}

//! In-memory profile tables keyed by id

use super::{CompanyProfile, CompanyRecord, JobProfile, JobRecord};
use crate::config::DataConfig;
use crate::error::{AnalyzerError, Result};
use log::{info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Job and company profiles parsed once and shared by every analysis.
#[derive(Debug, Default)]
pub struct ProfileStore {
    jobs: HashMap<i64, JobProfile>,
    companies: HashMap<String, CompanyProfile>,
    dimension: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub job_cd: i64,
    pub job_nm: String,
}

impl ProfileStore {
    pub fn load(config: &DataConfig) -> Result<Self> {
        Self::load_from_paths(
            &config.job_profiles,
            &config.company_profiles,
            config.expected_dimension,
        )
    }

    pub fn load_from_paths(
        job_path: &Path,
        company_path: &Path,
        expected_dimension: Option<usize>,
    ) -> Result<Self> {
        let jobs: Vec<JobRecord> = read_records(job_path)?;
        let companies: Vec<CompanyRecord> = read_records(company_path)?;

        let store = Self::from_records(
            jobs,
            companies,
            expected_dimension,
            &job_path.display().to_string(),
            &company_path.display().to_string(),
        )?;

        info!(
            "Loaded {} job profiles and {} company profiles (dimension {:?})",
            store.jobs.len(),
            store.companies.len(),
            store.dimension
        );
        Ok(store)
    }

    pub fn from_records(
        jobs: Vec<JobRecord>,
        companies: Vec<CompanyRecord>,
        expected_dimension: Option<usize>,
        job_source: &str,
        company_source: &str,
    ) -> Result<Self> {
        let mut store = Self {
            dimension: expected_dimension,
            ..Self::default()
        };

        for record in jobs {
            let profile = JobProfile::from_record(record, job_source)?;
            store.check_dimension(profile.dimension(), job_source, &format!("job {}", profile.job_cd))?;
            if store.jobs.contains_key(&profile.job_cd) {
                warn!("Duplicate job_cd {} in {}, keeping the first record", profile.job_cd, job_source);
                continue;
            }
            store.jobs.insert(profile.job_cd, profile);
        }

        for record in companies {
            let profile = CompanyProfile::from_record(record, company_source)?;
            store.check_dimension(
                profile.dimension(),
                company_source,
                &format!("company {}", profile.company_id),
            )?;
            if store.companies.contains_key(&profile.company_id) {
                warn!(
                    "Duplicate company_id {} in {}, keeping the first record",
                    profile.company_id, company_source
                );
                continue;
            }
            store.companies.insert(profile.company_id.clone(), profile);
        }

        Ok(store)
    }

    fn check_dimension(&mut self, found: usize, source_name: &str, owner: &str) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != found => Err(AnalyzerError::DimensionMismatch {
                context: format!("{} in {}", owner, source_name),
                expected,
                found,
            }),
            Some(_) => Ok(()),
            None => {
                self.dimension = Some(found);
                Ok(())
            }
        }
    }

    pub fn job(&self, job_cd: i64) -> Result<&JobProfile> {
        self.jobs.get(&job_cd).ok_or(AnalyzerError::JobNotFound(job_cd))
    }

    pub fn find_job(&self, job_cd: i64) -> Option<&JobProfile> {
        self.jobs.get(&job_cd)
    }

    /// Ids are trimmed on both load and lookup.
    pub fn company(&self, company_id: &str) -> Result<&CompanyProfile> {
        let key = company_id.trim();
        self.companies
            .get(key)
            .ok_or_else(|| AnalyzerError::CompanyNotFound(key.to_string()))
    }

    /// Common embedding dimension of every stored profile.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn company_count(&self) -> usize {
        self.companies.len()
    }

    /// Companies ordered by name.
    pub fn companies(&self) -> Vec<&CompanyProfile> {
        let mut companies: Vec<_> = self.companies.values().collect();
        companies.sort_by(|a, b| {
            a.company_name
                .cmp(&b.company_name)
                .then_with(|| a.company_id.cmp(&b.company_id))
        });
        companies
    }

    /// `top_nm -> aptit_name -> jobs`, for picking a job by category.
    pub fn job_taxonomy(&self) -> BTreeMap<String, BTreeMap<String, Vec<JobSummary>>> {
        let mut tree: BTreeMap<String, BTreeMap<String, Vec<JobSummary>>> = BTreeMap::new();

        for job in self.jobs.values() {
            let top = job.top_nm.clone().unwrap_or_else(|| "기타".to_string());
            let aptitude = job.aptit_name.clone().unwrap_or_else(|| "기타".to_string());
            tree.entry(top).or_default().entry(aptitude).or_default().push(JobSummary {
                job_cd: job.job_cd,
                job_nm: job.job_nm.clone(),
            });
        }

        for aptitudes in tree.values_mut() {
            for jobs in aptitudes.values_mut() {
                jobs.sort_by(|a, b| a.job_nm.cmp(&b.job_nm).then(a.job_cd.cmp(&b.job_cd)));
            }
        }
        tree
    }
}

fn read_records<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|e| AnalyzerError::InvalidProfile {
        source_name: path.display().to_string(),
        reason: format!("cannot read file: {}", e),
    })?;
    serde_json::from_str(&content).map_err(|e| AnalyzerError::InvalidProfile {
        source_name: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(job_cd: i64, name: &str, top: &str, embedding: Vec<f32>) -> JobRecord {
        JobRecord {
            job_cd,
            job_nm: name.to_string(),
            top_nm: Some(top.to_string()),
            aptit_name: Some("분석형".to_string()),
            work_summary: String::new(),
            main_abilities: vec![],
            skills: vec!["데이터 분석".to_string()],
            knowledge: vec![],
            interests: vec![],
            embedding,
        }
    }

    fn company(id: &str, embedding: Vec<f32>) -> CompanyRecord {
        CompanyRecord {
            company_id: id.to_string(),
            company_name: format!("회사{}", id),
            industry: String::new(),
            summary: String::new(),
            values: String::new(),
            talent: String::new(),
            tech_keywords: String::new(),
            embedding,
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let store = ProfileStore::from_records(
            vec![job(1, "데이터분석가", "IT", vec![1.0, 0.0])],
            vec![company("c1", vec![0.0, 1.0])],
            None,
            "jobs",
            "companies",
        )
        .unwrap();

        assert_eq!(store.job(1).unwrap().job_nm, "데이터분석가");
        assert_eq!(store.company("c1").unwrap().company_name, "회사c1");
        assert_eq!(store.dimension(), Some(2));
        assert!(matches!(store.job(2), Err(AnalyzerError::JobNotFound(2))));
        assert!(store.company("zz").unwrap_err().is_not_found());
    }

    #[test]
    fn test_company_ids_are_trimmed() {
        let store = ProfileStore::from_records(
            vec![],
            vec![company("  acme ", vec![1.0])],
            None,
            "jobs",
            "companies",
        )
        .unwrap();

        assert_eq!(store.company("acme").unwrap().company_id, "acme");
        assert_eq!(store.company(" acme").unwrap().company_id, "acme");
        assert!(matches!(
            store.company(" nobody "),
            Err(AnalyzerError::CompanyNotFound(id)) if id == "nobody"
        ));
    }

    #[test]
    fn test_rejects_mixed_dimensions() {
        let err = ProfileStore::from_records(
            vec![job(1, "a직무", "IT", vec![1.0, 0.0])],
            vec![company("c1", vec![0.0, 1.0, 0.0])],
            None,
            "jobs",
            "companies",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_expected_dimension_is_enforced() {
        let result = ProfileStore::from_records(
            vec![job(1, "a직무", "IT", vec![1.0, 0.0])],
            vec![],
            Some(3),
            "jobs",
            "companies",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_ids_keep_first_record() {
        let store = ProfileStore::from_records(
            vec![
                job(1, "첫번째", "IT", vec![1.0]),
                job(1, "두번째", "IT", vec![1.0]),
            ],
            vec![],
            None,
            "jobs",
            "companies",
        )
        .unwrap();
        assert_eq!(store.job_count(), 1);
        assert_eq!(store.job(1).unwrap().job_nm, "첫번째");
    }

    #[test]
    fn test_job_taxonomy_groups_by_category() {
        let store = ProfileStore::from_records(
            vec![
                job(2, "나직무", "IT", vec![1.0]),
                job(1, "가직무", "IT", vec![1.0]),
                job(3, "다직무", "경영", vec![1.0]),
            ],
            vec![],
            None,
            "jobs",
            "companies",
        )
        .unwrap();

        let tree = store.job_taxonomy();
        assert_eq!(tree.len(), 2);
        let it_jobs = &tree["IT"]["분석형"];
        assert_eq!(it_jobs[0].job_nm, "가직무");
        assert_eq!(it_jobs[1].job_cd, 2);
    }
}

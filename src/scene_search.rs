//! Login, search the inventory and write matching scene ids to a text file
use crate::earth_explorer::{
    additional_criteria, temporal_criteria, ApiKey, Credentials, Dataset, InventoryApi,
    RequestParams,
};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_MAX_RESULTS: u64 = 50000;

#[derive(Debug, Clone)]
pub struct SceneSearch {
    pub directory: PathBuf,
    pub wrs_path: Option<u32>,
    pub wrs_row: Option<u32>,
    pub dataset: Dataset,
    pub max_results: u64,
    /// `YYYY-MM-DD` or `YYYY-MM-DD,YYYY-MM-DD`
    pub acq_dates: Option<String>,
    pub months: Vec<u32>,
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub total_hits: u64,
    pub display_ids: Vec<String>,
    /// None when the search matched nothing.
    pub output: Option<PathBuf>,
}

impl SceneSearch {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            wrs_path: None,
            wrs_row: None,
            dataset: Dataset::default(),
            max_results: DEFAULT_MAX_RESULTS,
            acq_dates: None,
            months: vec![],
        }
    }

    pub fn build_params(self: &Self, api_key: &ApiKey) -> Result<RequestParams> {
        let mut params = RequestParams::new(api_key, self.dataset, self.max_results);
        if self.wrs_path.is_some() || self.wrs_row.is_some() {
            params.merge(additional_criteria(self.wrs_path, self.wrs_row));
        }
        if let Some(dates) = &self.acq_dates {
            params.merge(temporal_criteria(dates)?);
        }
        params.with_months(&self.months);
        Ok(params)
    }

    /// `{dates}_p{path}-r{row}_scenes.txt` inside the target directory.
    pub fn output_path(self: &Self) -> PathBuf {
        let dates = match &self.acq_dates {
            Some(dates) => dates.replace(',', ""),
            None => "alldates".to_string(),
        };
        let path = self.wrs_path.map_or("any".to_string(), |p| p.to_string());
        let row = self.wrs_row.map_or("any".to_string(), |r| r.to_string());
        self.directory.join(format!("{dates}_p{path}-r{row}_scenes.txt"))
    }

    pub async fn run(
        self: &Self,
        api: &impl InventoryApi,
        credentials: &Credentials,
    ) -> Result<SearchOutcome> {
        // Reject a malformed date spec before talking to the service
        if let Some(dates) = &self.acq_dates {
            temporal_criteria(dates)?;
        }

        let api_key = api.login(credentials).await?;
        debug!(username = %credentials.username, "logged in");

        let params = self.build_params(&api_key)?;
        let results = api.search(&params).await?;
        info!(
            total_hits = results.total_hits,
            returned = results.results.len(),
            "search complete"
        );

        let display_ids = results
            .results
            .into_iter()
            .map(|scene| scene.display_id)
            .collect::<Vec<_>>();

        println!("Path: {} {}", display_opt(self.wrs_path), display_opt(self.wrs_row));
        println!("Number of results: {}", results.total_hits);
        println!("Product IDs: ");
        for id in display_ids.iter() {
            println!("{id}");
        }

        if display_ids.is_empty() {
            info!("No scenes matched, nothing written");
            return Ok(SearchOutcome {
                total_hits: results.total_hits,
                display_ids,
                output: None,
            });
        }

        if !self.directory.exists() {
            fs::create_dir_all(&self.directory).with_context(|| {
                format!("Unable to create directory {}", self.directory.display())
            })?;
        }

        let output = self.output_path();
        SceneList::new(display_ids.clone())
            .write(&output)
            .with_context(|| format!("Unable to write scene list {}", output.display()))?;
        println!("Wrote results out to {}", output.display());

        Ok(SearchOutcome {
            total_hits: results.total_hits,
            display_ids,
            output: Some(output),
        })
    }
}

fn display_opt(value: Option<u32>) -> String {
    value.map_or("-".to_string(), |v| v.to_string())
}

/// Scene ids as written to disk, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneList {
    pub ids: Vec<String>,
}

impl SceneList {
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let ids = content
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self { ids })
    }

    /// Replaces any existing file at `path`.
    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<()> {
        let mut content = String::new();
        for id in self.ids.iter() {
            content.push_str(id);
            content.push('\n');
        }
        fs::write(path, content)?;
        Ok(())
    }
}

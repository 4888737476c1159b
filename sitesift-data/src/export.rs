//! CSV export of finalised country result sets.
//!
//! One file per country per dataset, named
//! `<Country>_<dataset>_tiled.csv` inside the dataset's output directory,
//! which is created on demand. The column schema is fixed per dataset and
//! rows are written in the survey's publication order. Writing is pure
//! formatting; failures surface to the caller and nothing already written
//! is rolled back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sitesift_core::{
    Classification, CountryResultSet, Dataset, ParseFeatureIdError, SiteRecord,
};
use thiserror::Error;

/// Errors returned by [`write_country`] and [`read_country`].
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output directory could not be created.
    #[error("failed to create output directory {path:?}")]
    CreateDir {
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
        /// Directory that could not be created.
        path: PathBuf,
    },
    /// A row or the file itself could not be written.
    #[error("failed to write {path:?}")]
    Write {
        /// The underlying CSV failure.
        #[source]
        source: csv::Error,
        /// File that could not be written.
        path: PathBuf,
    },
    /// The file could not be read back.
    #[error("failed to read {path:?}")]
    Read {
        /// The underlying CSV failure.
        #[source]
        source: csv::Error,
        /// File that could not be read.
        path: PathBuf,
    },
    /// A read-back row carried an unparseable feature id.
    #[error("{path:?} holds an invalid feature id")]
    InvalidId {
        /// The underlying parse failure.
        #[source]
        source: ParseFeatureIdError,
        /// File the row came from.
        path: PathBuf,
    },
}

impl ExportError {
    /// Whether the failure means the disk itself is exhausted.
    ///
    /// Disk exhaustion is the one export failure the multi-country run does
    /// not absorb.
    #[must_use]
    pub fn is_disk_full(&self) -> bool {
        match self {
            Self::CreateDir { source, .. } => source.kind() == io::ErrorKind::StorageFull,
            Self::Write { source, .. } | Self::Read { source, .. } => {
                matches!(source.kind(), csv::ErrorKind::Io(io) if io.kind() == io::ErrorKind::StorageFull)
            }
            Self::InvalidId { .. } => false,
        }
    }
}

/// Serialise a finalised result set to its CSV file.
///
/// Returns the path of the written file.
///
/// # Errors
///
/// Returns an [`ExportError`] when the directory cannot be created or the
/// file cannot be written.
pub fn write_country(
    output_root: &Path,
    country: &str,
    dataset: Dataset,
    records: &CountryResultSet,
) -> Result<PathBuf, ExportError> {
    let directory = output_root.join(dataset.output_dir());
    fs::create_dir_all(&directory).map_err(|source| ExportError::CreateDir {
        source,
        path: directory.clone(),
    })?;

    let path = directory.join(file_name(country, dataset));
    let mut rows: Vec<&SiteRecord> = records.records().collect();
    sort_for_publication(dataset, &mut rows);

    let mut writer = csv::Writer::from_path(&path).map_err(|source| ExportError::Write {
        source,
        path: path.clone(),
    })?;
    let write_failed = |source| ExportError::Write {
        source,
        path: path.clone(),
    };
    if rows.is_empty() {
        // serde only emits the header alongside the first row; an empty
        // result set still gets a header-only file.
        writer.write_record(header(dataset)).map_err(write_failed)?;
    }
    for record in rows {
        match dataset {
            Dataset::Worship => writer.serialize(WorshipRow::from(record)),
            Dataset::ReligiousHistory => writer.serialize(ReligiousHistoryRow::from(record)),
            Dataset::Conflict => writer.serialize(ConflictRow::from(record)),
        }
        .map_err(write_failed)?;
    }
    writer
        .flush()
        .map_err(|source| write_failed(csv::Error::from(source)))?;

    Ok(path)
}

/// Read a previously exported file back into records.
///
/// The inverse of [`write_country`]; round-tripping preserves identifier,
/// coordinates and classification for every row.
///
/// # Errors
///
/// Returns an [`ExportError`] when the file cannot be read or a row does
/// not parse.
pub fn read_country(path: &Path, dataset: Dataset) -> Result<Vec<SiteRecord>, ExportError> {
    let read_failed = |source| ExportError::Read {
        source,
        path: path.to_path_buf(),
    };
    let mut reader = csv::Reader::from_path(path).map_err(read_failed)?;

    let mut records = Vec::new();
    match dataset {
        Dataset::Worship => {
            for row in reader.deserialize::<WorshipRow>() {
                records.push(row.map_err(read_failed)?.into_record(path)?);
            }
        }
        Dataset::ReligiousHistory => {
            for row in reader.deserialize::<ReligiousHistoryRow>() {
                records.push(row.map_err(read_failed)?.into_record(path)?);
            }
        }
        Dataset::Conflict => {
            for row in reader.deserialize::<ConflictRow>() {
                records.push(row.map_err(read_failed)?.into_record(path)?);
            }
        }
    }
    Ok(records)
}

/// Column names per dataset, matching the serde field order of the row
/// types below.
fn header(dataset: Dataset) -> &'static [&'static str] {
    match dataset {
        Dataset::Worship => &[
            "name",
            "denomination",
            "religion",
            "lat",
            "lon",
            "osm_id",
            "wikidata",
            "wikipedia",
        ],
        Dataset::ReligiousHistory => &[
            "name",
            "site_type",
            "civilization",
            "lat",
            "lon",
            "osm_id",
            "wikidata",
            "wikipedia",
        ],
        Dataset::Conflict => &[
            "name",
            "conflict_type",
            "lat",
            "lon",
            "osm_id",
            "wikidata",
            "wikipedia",
        ],
    }
}

/// `<Country>_<dataset>_tiled.csv` with the country name made filesystem
/// safe.
fn file_name(country: &str, dataset: Dataset) -> String {
    format!("{}_{}_tiled.csv", sanitise(country), dataset.slug())
}

/// Replace forbidden path characters and whitespace runs with underscores.
fn sanitise(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_gap = false;
    for ch in name.trim().chars() {
        if ch.is_whitespace() {
            pending_gap = true;
            continue;
        }
        if pending_gap {
            out.push('_');
            pending_gap = false;
        }
        out.push(match ch {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        });
    }
    out
}

/// Order rows the way the published spreadsheets are ordered: worship by
/// religion and denomination, the other datasets by classification, named
/// rows ahead of unnamed ones throughout.
fn sort_for_publication(dataset: Dataset, rows: &mut [&SiteRecord]) {
    match dataset {
        Dataset::Worship => rows.sort_by(|a, b| worship_key(a).cmp(&worship_key(b))),
        Dataset::ReligiousHistory | Dataset::Conflict => {
            rows.sort_by(|a, b| labelled_key(a).cmp(&labelled_key(b)));
        }
    }
}

type WorshipKey<'a> = (
    bool,
    Option<&'a str>,
    bool,
    Option<&'a str>,
    bool,
    Option<&'a str>,
);

fn worship_key<'a>(record: &'a SiteRecord) -> WorshipKey<'a> {
    let (religion, denomination) = match &record.classification {
        Classification::Worship {
            religion,
            denomination,
        } => (religion.as_deref(), denomination.as_deref()),
        _ => (None, None),
    };
    let name = record.name.as_deref();
    (
        religion.is_none(),
        religion,
        denomination.is_none(),
        denomination,
        name.is_none(),
        name,
    )
}

fn labelled_key<'a>(record: &'a SiteRecord) -> (bool, &'a str, Option<&'a str>) {
    let label = match &record.classification {
        Classification::ReligiousHistory { site_type, .. } => site_type.as_str(),
        Classification::Conflict { conflict_type } => conflict_type.as_str(),
        Classification::Worship { .. } => "",
    };
    (record.name.is_none(), label, record.name.as_deref())
}

#[derive(Debug, Serialize, Deserialize)]
struct WorshipRow {
    name: Option<String>,
    denomination: Option<String>,
    religion: Option<String>,
    lat: f64,
    lon: f64,
    osm_id: String,
    wikidata: Option<String>,
    wikipedia: Option<String>,
}

impl From<&SiteRecord> for WorshipRow {
    fn from(record: &SiteRecord) -> Self {
        let (religion, denomination) = match &record.classification {
            Classification::Worship {
                religion,
                denomination,
            } => (religion.clone(), denomination.clone()),
            _ => (None, None),
        };
        Self {
            name: record.name.clone(),
            denomination,
            religion,
            lat: record.location.y,
            lon: record.location.x,
            osm_id: record.id.to_string(),
            wikidata: record.wikidata.clone(),
            wikipedia: record.wikipedia.clone(),
        }
    }
}

impl WorshipRow {
    fn into_record(self, path: &Path) -> Result<SiteRecord, ExportError> {
        Ok(SiteRecord {
            id: parse_id(&self.osm_id, path)?,
            name: self.name,
            classification: Classification::Worship {
                religion: self.religion,
                denomination: self.denomination,
            },
            location: geo::Coord {
                x: self.lon,
                y: self.lat,
            },
            wikidata: self.wikidata,
            wikipedia: self.wikipedia,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ReligiousHistoryRow {
    name: Option<String>,
    site_type: String,
    civilization: Option<String>,
    lat: f64,
    lon: f64,
    osm_id: String,
    wikidata: Option<String>,
    wikipedia: Option<String>,
}

impl From<&SiteRecord> for ReligiousHistoryRow {
    fn from(record: &SiteRecord) -> Self {
        let (site_type, civilization) = match &record.classification {
            Classification::ReligiousHistory {
                site_type,
                civilization,
            } => (site_type.clone(), civilization.clone()),
            _ => (String::new(), None),
        };
        Self {
            name: record.name.clone(),
            site_type,
            civilization,
            lat: record.location.y,
            lon: record.location.x,
            osm_id: record.id.to_string(),
            wikidata: record.wikidata.clone(),
            wikipedia: record.wikipedia.clone(),
        }
    }
}

impl ReligiousHistoryRow {
    fn into_record(self, path: &Path) -> Result<SiteRecord, ExportError> {
        Ok(SiteRecord {
            id: parse_id(&self.osm_id, path)?,
            name: self.name,
            classification: Classification::ReligiousHistory {
                site_type: self.site_type,
                civilization: self.civilization,
            },
            location: geo::Coord {
                x: self.lon,
                y: self.lat,
            },
            wikidata: self.wikidata,
            wikipedia: self.wikipedia,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ConflictRow {
    name: Option<String>,
    conflict_type: String,
    lat: f64,
    lon: f64,
    osm_id: String,
    wikidata: Option<String>,
    wikipedia: Option<String>,
}

impl From<&SiteRecord> for ConflictRow {
    fn from(record: &SiteRecord) -> Self {
        let conflict_type = match &record.classification {
            Classification::Conflict { conflict_type } => conflict_type.clone(),
            _ => String::new(),
        };
        Self {
            name: record.name.clone(),
            conflict_type,
            lat: record.location.y,
            lon: record.location.x,
            osm_id: record.id.to_string(),
            wikidata: record.wikidata.clone(),
            wikipedia: record.wikipedia.clone(),
        }
    }
}

impl ConflictRow {
    fn into_record(self, path: &Path) -> Result<SiteRecord, ExportError> {
        Ok(SiteRecord {
            id: parse_id(&self.osm_id, path)?,
            name: self.name,
            classification: Classification::Conflict {
                conflict_type: self.conflict_type,
            },
            location: geo::Coord {
                x: self.lon,
                y: self.lat,
            },
            wikidata: self.wikidata,
            wikipedia: self.wikipedia,
        })
    }
}

fn parse_id(text: &str, path: &Path) -> Result<sitesift_core::FeatureId, ExportError> {
    text.parse().map_err(|source| ExportError::InvalidId {
        source,
        path: path.to_path_buf(),
    })
}

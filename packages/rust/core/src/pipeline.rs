//! End-to-end compile pipeline: discover → exclude → per profile select → assemble.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use stationforge_discovery::{DiscoveryOptions, discover, exclude};
use stationforge_shared::{Candidate, CompileConfig, Result};

use crate::assembler::{self, AssembleResult};

/// Result of a full compile run.
#[derive(Debug)]
pub struct CompileReport {
    /// One entry per profile, in processing order.
    pub profiles: Vec<AssembleResult>,
    /// Station files found before exclusion.
    pub stations_found: usize,
    /// Station files removed by the exclude list.
    pub stations_excluded: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Stations a profile would receive, without reading or writing anything.
#[derive(Debug, Clone)]
pub struct ProfilePlan {
    /// Profile document path.
    pub target: PathBuf,
    /// Selected stations, in output order.
    pub stations: Vec<Candidate>,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a profile is assembled.
    fn profile_started(&self, target: &std::path::Path, current: usize, total: usize);
    /// Called after a profile has been written.
    fn profile_written(&self, result: &AssembleResult);
    /// Called when the pipeline completes.
    fn done(&self, report: &CompileReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn profile_started(&self, _target: &std::path::Path, _current: usize, _total: usize) {}
    fn profile_written(&self, _result: &AssembleResult) {}
    fn done(&self, _report: &CompileReport) {}
}

/// Discover station files and apply the exclude list.
///
/// Returns the remaining candidates and the number found before exclusion.
pub fn gather(config: &CompileConfig) -> Result<(Vec<Candidate>, usize)> {
    let opts = DiscoveryOptions::new(
        &config.stations_root,
        &config.stations_label,
        &config.extension,
    );
    let found = discover(&opts)?;
    let count = found.len();
    Ok((exclude(found, &config.exclude), count))
}

/// Work out which stations each profile would receive.
pub fn plan(config: &CompileConfig) -> Result<Vec<ProfilePlan>> {
    let (candidates, _) = gather(config)?;

    Ok(config
        .profiles
        .iter()
        .map(|spec| ProfilePlan {
            target: spec.target.clone(),
            stations: assembler::select(&candidates, &spec.filters, config.duplicate_matches),
        })
        .collect())
}

/// Run the full compile pipeline.
///
/// Profiles are processed in configured order. The first failure aborts the
/// run; profiles written before it keep their new contents.
#[instrument(skip_all, fields(root = %config.stations_root.display(), profiles = config.profiles.len()))]
pub fn compile(config: &CompileConfig, progress: &dyn ProgressReporter) -> Result<CompileReport> {
    let start = Instant::now();

    progress.phase("Discovering stations");
    let (candidates, stations_found) = gather(config)?;
    let stations_excluded = stations_found - candidates.len();

    let total = config.profiles.len();
    let mut profiles = Vec::with_capacity(total);

    for (i, spec) in config.profiles.iter().enumerate() {
        progress.profile_started(&spec.target, i + 1, total);

        let selected = assembler::select(&candidates, &spec.filters, config.duplicate_matches);
        let result = assembler::assemble(spec, &selected, &config.collection_field)?;

        progress.profile_written(&result);
        profiles.push(result);
    }

    let report = CompileReport {
        profiles,
        stations_found,
        stations_excluded,
        elapsed: start.elapsed(),
    };

    info!(
        profiles = report.profiles.len(),
        stations_found,
        stations_excluded,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "compile complete"
    );

    progress.done(&report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::{Value, json};
    use stationforge_shared::{DuplicateMatches, ProfileSpec, StationForgeError};

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sf-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_station(root: &Path, group: &str, id: &str) {
        let dir = root.join("stations").join(group);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{id}.station")), json!({ "id": id }).to_string()).unwrap();
    }

    fn write_profile(root: &Path, file: &str, name: &str) -> PathBuf {
        let path = root.join(file);
        std::fs::write(&path, json!({ "name": name }).to_string()).unwrap();
        path
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    fn config(root: &Path, profiles: Vec<ProfileSpec>) -> CompileConfig {
        CompileConfig {
            stations_root: root.join("stations"),
            stations_label: "./stations".into(),
            extension: "station".into(),
            exclude: Vec::new(),
            collection_field: "stations".into(),
            duplicate_matches: DuplicateMatches::Collapse,
            profiles,
        }
    }

    fn spec(target: &Path, filters: &[&str]) -> ProfileSpec {
        ProfileSpec::new(target, filters.iter().map(|f| (*f).to_string()).collect())
    }

    /// SCT/KLAX, SCT/KSNA, L30/KLAS, L30/KHND.
    fn fixture() -> PathBuf {
        let tmp = temp_dir();
        write_station(&tmp, "SCT", "KSNA");
        write_station(&tmp, "SCT", "KLAX");
        write_station(&tmp, "L30", "KLAS");
        write_station(&tmp, "L30", "KHND");
        tmp
    }

    #[test]
    fn compile_merges_matching_stations_in_path_order() {
        let tmp = fixture();
        let sct = write_profile(&tmp, "sct.json", "SoCal (SCT)");

        let cfg = config(&tmp, vec![spec(&sct, &["/SCT"])]);
        let report = compile(&cfg, &SilentProgress).unwrap();

        assert_eq!(report.stations_found, 4);
        assert_eq!(report.stations_excluded, 0);
        assert_eq!(report.profiles[0].station_count, 2);
        assert_eq!(
            read(&sct),
            json!({"name": "SoCal (SCT)", "stations": [{"id": "KLAX"}, {"id": "KSNA"}]})
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn compile_is_idempotent() {
        let tmp = fixture();
        let zla = write_profile(&tmp, "zla.json", "ZLA");
        let cfg = config(&tmp, vec![spec(&zla, &["KLAX", "KLAS"])]);

        compile(&cfg, &SilentProgress).unwrap();
        let first = std::fs::read(&zla).unwrap();
        compile(&cfg, &SilentProgress).unwrap();
        let second = std::fs::read(&zla).unwrap();

        assert_eq!(first, second);
        assert_eq!(read(&zla)["stations"].as_array().unwrap().len(), 2);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn profiles_may_share_stations() {
        let tmp = fixture();
        let l30 = write_profile(&tmp, "l30.json", "L30");
        let zla = write_profile(&tmp, "zla.json", "ZLA");
        let cfg = config(&tmp, vec![spec(&l30, &["/L30"]), spec(&zla, &["KLAS", "KLAX"])]);

        compile(&cfg, &SilentProgress).unwrap();

        assert_eq!(read(&l30)["stations"], json!([{"id": "KHND"}, {"id": "KLAS"}]));
        // ./stations/L30/KLAS sorts before ./stations/SCT/KLAX.
        assert_eq!(read(&zla)["stations"], json!([{"id": "KLAS"}, {"id": "KLAX"}]));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unmatched_profile_gets_empty_array() {
        let tmp = fixture();
        let path = tmp.join("jcf.json");
        std::fs::write(&path, r#"{"name":"JCF","stations":[{"id":"OLD"}],"atisFreq":1}"#).unwrap();

        let cfg = config(&tmp, vec![spec(&path, &["/JCF"])]);
        compile(&cfg, &SilentProgress).unwrap();

        assert_eq!(read(&path), json!({"name": "JCF", "stations": [], "atisFreq": 1}));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn exclusions_apply_to_every_profile() {
        let tmp = fixture();
        let sct = write_profile(&tmp, "sct.json", "SCT");
        let l30 = write_profile(&tmp, "l30.json", "L30");

        let mut cfg = config(&tmp, vec![spec(&sct, &["/SCT"]), spec(&l30, &["/L30"])]);
        cfg.exclude = vec!["KLAX".into(), "KHND".into()];
        let report = compile(&cfg, &SilentProgress).unwrap();

        assert_eq!(report.stations_excluded, 2);
        assert_eq!(read(&sct)["stations"], json!([{"id": "KSNA"}]));
        assert_eq!(read(&l30)["stations"], json!([{"id": "KLAS"}]));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_exclude_list_matches_no_exclusion() {
        let tmp = fixture();
        let cfg = config(&tmp, vec![spec(&tmp.join("x.json"), &["/SCT", "/L30"])]);

        let (all, found) = gather(&cfg).unwrap();
        assert_eq!(all.len(), found);

        let mut filtered = cfg.clone();
        filtered.exclude = vec!["NO-SUCH-STATION".into()];
        let (same, _) = gather(&filtered).unwrap();
        assert_eq!(all, same);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn repeat_mode_duplicates_multiply_matched_stations() {
        let tmp = fixture();
        let sct = write_profile(&tmp, "sct.json", "SCT");
        let mut cfg = config(&tmp, vec![spec(&sct, &["/SCT", "KLAX"])]);
        cfg.duplicate_matches = DuplicateMatches::Repeat;

        compile(&cfg, &SilentProgress).unwrap();

        assert_eq!(
            read(&sct)["stations"],
            json!([{"id": "KLAX"}, {"id": "KLAX"}, {"id": "KSNA"}])
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_profile_aborts_run() {
        let tmp = fixture();
        let cfg = config(&tmp, vec![spec(&tmp.join("absent.json"), &["/SCT"])]);

        let err = compile(&cfg, &SilentProgress).unwrap_err();
        assert!(matches!(err, StationForgeError::Io { .. }));
        assert!(!tmp.join("absent.json").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_station_aborts_run() {
        let tmp = fixture();
        std::fs::write(tmp.join("stations/SCT/KONT.station"), "{").unwrap();
        let l30 = write_profile(&tmp, "l30.json", "L30");
        let sct = write_profile(&tmp, "sct.json", "SCT");

        let cfg = config(&tmp, vec![spec(&l30, &["/L30"]), spec(&sct, &["/SCT"])]);
        let err = compile(&cfg, &SilentProgress).unwrap_err();

        assert!(matches!(err, StationForgeError::Parse { .. }));
        assert_eq!(read(&l30)["stations"].as_array().unwrap().len(), 2);
        assert_eq!(read(&sct), json!({"name": "SCT"}));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_profile_aborts_run() {
        let tmp = fixture();
        let broken = tmp.join("broken.json");
        std::fs::write(&broken, r#"{"name":"#).unwrap();
        let sct = write_profile(&tmp, "sct.json", "SCT");

        let cfg = config(&tmp, vec![spec(&broken, &["/L30"]), spec(&sct, &["/SCT"])]);
        let err = compile(&cfg, &SilentProgress).unwrap_err();

        assert!(matches!(err, StationForgeError::Parse { .. }));
        assert_eq!(std::fs::read_to_string(&broken).unwrap(), r#"{"name":"#);
        assert_eq!(read(&sct), json!({"name": "SCT"}));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn plan_lists_stations_without_writing() {
        let tmp = fixture();
        let sct = write_profile(&tmp, "sct.json", "SCT");
        let cfg = config(&tmp, vec![spec(&sct, &["/SCT"]), spec(&tmp.join("none.json"), &[])]);

        let plans = plan(&cfg).unwrap();

        assert_eq!(plans.len(), 2);
        let keys: Vec<_> = plans[0].stations.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["./stations/SCT/KLAX.station", "./stations/SCT/KSNA.station"]);
        assert!(plans[1].stations.is_empty());
        assert_eq!(read(&sct), json!({"name": "SCT"}));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}

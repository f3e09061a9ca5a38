use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use anyhow::{Context, bail};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::chain::types::PairId;
use crate::planner::types::{CurveSnapshot, FEE_BASE};

/// Source of the AMM's currently active curve parameters.
///
/// Implementations must return parameters that are fresh at call time, or
/// fail. The engine has no staleness detection, so partial or cached data
/// must never be returned in place of an error.
#[async_trait]
pub trait SnapshotReader: Send + Sync {
    async fn fetch_snapshot(&self, pair: &PairId) -> anyhow::Result<CurveSnapshot>;
}

/// Reads snapshots from a JSON file exported by an external chain reader.
///
/// The file holds either one snapshot object or an object of snapshots keyed
/// by pair label or `0x` pair id. It is re-read on every call so each cycle
/// sees the latest export.
#[derive(Clone, Debug)]
pub struct JsonSnapshotReader {
    path: PathBuf,
}

impl JsonSnapshotReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotReader for JsonSnapshotReader {
    #[instrument(skip(self), fields(path = %self.path.display()), level = "debug")]
    async fn fetch_snapshot(&self, pair: &PairId) -> anyhow::Result<CurveSnapshot> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read snapshot file {}", self.path.display()))?;

        // No untagged enum here: buffered serde content cannot hold u128.
        let snapshot = match serde_json::from_str::<CurveSnapshot>(&raw) {
            Ok(s) => s,
            Err(_) => {
                let map: BTreeMap<String, CurveSnapshot> = serde_json::from_str(&raw)
                    .with_context(|| format!("malformed snapshot file {}", self.path.display()))?;
                select_pair(map, pair)?
            }
        };

        check_snapshot(&snapshot)?;

        debug!(
            concentration = %snapshot.concentration,
            spread = %snapshot.spread,
            "snapshot loaded"
        );

        Ok(snapshot)
    }
}

/// Resolves every key up front so a bad or ambiguous file fails on every read,
/// not only when iteration happens to reach the broken entry first.
fn select_pair(map: BTreeMap<String, CurveSnapshot>, pair: &PairId) -> anyhow::Result<CurveSnapshot> {
    let mut by_id: HashMap<PairId, (String, CurveSnapshot)> = HashMap::with_capacity(map.len());

    for (key, snap) in map {
        let id: PairId = key
            .parse()
            .with_context(|| format!("bad pair key {key:?} in snapshot file"))?;
        if let Some((prev, _)) = by_id.get(&id) {
            bail!("snapshot keys {prev:?} and {key:?} both resolve to pair {id}");
        }
        by_id.insert(id, (key, snap));
    }

    match by_id.remove(pair) {
        Some((_, snap)) => Ok(snap),
        None => bail!("no snapshot for pair {pair}"),
    }
}

/// Rejects snapshots the contract could never have produced.
pub fn check_snapshot(snapshot: &CurveSnapshot) -> anyhow::Result<()> {
    if snapshot.spread > FEE_BASE {
        bail!(
            "snapshot spread {} exceeds fee base {}",
            snapshot.spread,
            FEE_BASE
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("curve-keeper-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    const SNAP: &str = r#"{
        "concentration": 5000000,
        "mult_x": 1000000000000000000,
        "mult_y": 1000000000000000000,
        "spread": 300,
        "target_x": 100000000000000000000,
        "target_y": 140000000000
    }"#;

    #[tokio::test]
    async fn reads_single_snapshot_file() {
        let path = temp_file(SNAP);
        let reader = JsonSnapshotReader::new(&path);

        let snap = reader
            .fetch_snapshot(&PairId::from_label("WETH/USDC"))
            .await
            .unwrap();
        assert_eq!(snap.concentration, 5_000_000);
        assert_eq!(snap.spread, 300);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn selects_pair_from_keyed_file() {
        let path = temp_file(&format!(r#"{{ "WETH/USDC": {SNAP}, "WBTC/USDC": {SNAP} }}"#));
        let reader = JsonSnapshotReader::new(&path);

        assert!(
            reader
                .fetch_snapshot(&PairId::from_label("WBTC/USDC"))
                .await
                .is_ok()
        );

        let err = reader
            .fetch_snapshot(&PairId::from_label("SOL/USDC"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no snapshot for pair"));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn malformed_sibling_key_fails_every_read() {
        let path = temp_file(&format!(
            r#"{{ "WETH/USDC": {SNAP}, "0x12": {SNAP}, "A": {SNAP}, "B": {SNAP} }}"#
        ));
        let reader = JsonSnapshotReader::new(&path);

        for _ in 0..10 {
            let err = reader
                .fetch_snapshot(&PairId::from_label("WETH/USDC"))
                .await
                .unwrap_err();
            assert!(err.to_string().contains("bad pair key \"0x12\""));
        }

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn label_and_hex_for_same_pair_are_ambiguous() {
        let hex = PairId::from_label("WETH/USDC").to_string();
        let other = SNAP.replace("\"spread\": 300", "\"spread\": 800");
        let path = temp_file(&format!(r#"{{ "WETH/USDC": {SNAP}, "{hex}": {other} }}"#));
        let reader = JsonSnapshotReader::new(&path);

        let err = reader
            .fetch_snapshot(&PairId::from_label("WETH/USDC"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("both resolve to pair"));

        // the conflict is reported even when asking for another pair
        assert!(
            reader
                .fetch_snapshot(&PairId::from_label("WBTC/USDC"))
                .await
                .is_err()
        );

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn selects_pair_by_hex_key() {
        let id = PairId::from_label("WBTC/USDC");
        let path = temp_file(&format!(r#"{{ "{id}": {SNAP} }}"#));
        let reader = JsonSnapshotReader::new(&path);

        let snap = reader.fetch_snapshot(&id).await.unwrap();
        assert_eq!(snap.spread, 300);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let reader = JsonSnapshotReader::new("/nonexistent/curve-keeper/snapshot.json");
        assert!(
            reader
                .fetch_snapshot(&PairId::from_label("WETH/USDC"))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn spread_above_fee_base_is_rejected() {
        let path = temp_file(&SNAP.replace("\"spread\": 300", "\"spread\": 1000001"));
        let reader = JsonSnapshotReader::new(&path);

        let err = reader
            .fetch_snapshot(&PairId::from_label("WETH/USDC"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exceeds fee base"));

        std::fs::remove_file(path).ok();
    }
}

use chrono::NaiveDateTime;
use tracing::debug;

use crate::config::{volatility_thresholds, TOP_MARKET_CAP_COUNT, TOP_VOLATILE_COUNT};
use crate::error::{AppError, Result};
use crate::types::{AnalysisSummary, MarketRecord, MarketSnapshot};

/// Turn the raw `/coins/markets` array into a snapshot.
///
/// Entries missing any of name, symbol, current_price, market_cap,
/// total_volume or price_change_percentage_24h are dropped. Source order is
/// kept (it is already market-cap descending).
pub fn normalize(raw: &[serde_json::Value], max_records: usize) -> MarketSnapshot {
    let mut dropped = 0usize;
    let records: Vec<MarketRecord> = raw
        .iter()
        .filter_map(|item| {
            let record = parse_market_record(item);
            if record.is_none() {
                dropped += 1;
            }
            record
        })
        .collect();

    if dropped > 0 {
        debug!(dropped, kept = records.len(), "Dropped incomplete market records");
    }

    MarketSnapshot::from_records(records, max_records)
}

/// Parse one raw market object. `None` if a required field is missing or null.
pub fn parse_market_record(v: &serde_json::Value) -> Option<MarketRecord> {
    let name = v.get("name")?.as_str()?.to_string();
    let symbol = v.get("symbol")?.as_str()?.to_string();
    let id = v
        .get("id")
        .and_then(|s| s.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| symbol.to_lowercase());

    Some(MarketRecord {
        id,
        name,
        symbol,
        price: number_field(v, "current_price")?,
        market_cap: number_field(v, "market_cap")?,
        volume_24h: number_field(v, "total_volume")?,
        change_24h_pct: number_field(v, "price_change_percentage_24h")?,
    })
}

fn number_field(v: &serde_json::Value, key: &str) -> Option<f64> {
    v.get(key)
        .and_then(|x| x.as_f64().or_else(|| x.as_str().and_then(|s| s.parse().ok())))
        .filter(|x| x.is_finite())
}

/// Compute the summary for one snapshot, stamped with `now`.
pub fn analyze(snapshot: &MarketSnapshot, now: NaiveDateTime) -> Result<AnalysisSummary> {
    let records = snapshot.records();
    let Some(first) = records.first() else {
        return Err(AppError::Compute("snapshot contains no records".to_string()));
    };

    let count = records.len() as f64;

    let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean_price = (prices.iter().sum::<f64>() / count).clamp(min_price, max_price);
    let median_price = median(prices);

    let total_market_cap: f64 = records.iter().map(|r| r.market_cap).sum();
    let total_volume: f64 = records.iter().map(|r| r.volume_24h).sum();

    // Strict comparisons: the first record holding the extreme value wins.
    let highest_change = records
        .iter()
        .fold(first, |best, r| if r.change_24h_pct > best.change_24h_pct { r } else { best });
    let lowest_change = records
        .iter()
        .fold(first, |best, r| if r.change_24h_pct < best.change_24h_pct { r } else { best });

    let moves_over = |threshold: f64| {
        records
            .iter()
            .filter(|r| r.change_24h_pct.abs() > threshold)
            .count()
    };

    Ok(AnalysisSummary {
        timestamp: now,
        coin_count: records.len(),
        top_by_market_cap: records.iter().take(TOP_MARKET_CAP_COUNT).cloned().collect(),
        mean_price,
        median_price,
        total_market_cap,
        highest_change: highest_change.clone(),
        lowest_change: lowest_change.clone(),
        most_volatile: most_volatile(snapshot, TOP_VOLATILE_COUNT),
        total_volume,
        mean_volume: total_volume / count,
        concentration_pct: concentration_ratio(snapshot, TOP_MARKET_CAP_COUNT),
        moves_over_high: moves_over(volatility_thresholds::HIGH),
        moves_over_extreme: moves_over(volatility_thresholds::EXTREME),
    })
}

/// Percent of total market cap held by the first `k` records. 0 when the
/// total is not positive.
pub fn concentration_ratio(snapshot: &MarketSnapshot, k: usize) -> f64 {
    let records = snapshot.records();
    let total: f64 = records.iter().map(|r| r.market_cap).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let top: f64 = records.iter().take(k).map(|r| r.market_cap).sum();
    (top / total * 100.0).clamp(0.0, 100.0)
}

/// The `k` records with the largest |24h change|; ties keep snapshot order.
pub fn most_volatile(snapshot: &MarketSnapshot, k: usize) -> Vec<MarketRecord> {
    let mut ranked: Vec<&MarketRecord> = snapshot.records().iter().collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.change_24h_pct.abs().total_cmp(&a.change_24h_pct.abs()));
    ranked.into_iter().take(k).cloned().collect()
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn rec(name: &str, price: f64, cap: f64, change: f64) -> MarketRecord {
        MarketRecord {
            id: name.to_lowercase(),
            name: name.to_string(),
            symbol: name[..3.min(name.len())].to_lowercase(),
            price,
            market_cap: cap,
            volume_24h: cap / 10.0,
            change_24h_pct: change,
        }
    }

    fn snapshot(records: Vec<MarketRecord>) -> MarketSnapshot {
        MarketSnapshot::from_records(records, 50)
    }

    fn raw_coin(id: &str, cap: f64) -> serde_json::Value {
        json!({
            "id": id,
            "name": id.to_uppercase(),
            "symbol": id,
            "current_price": 10.0,
            "market_cap": cap,
            "total_volume": 1000.0,
            "price_change_percentage_24h": 1.5,
            "ath": 99.0,
        })
    }

    #[test]
    fn normalize_keeps_six_fields_in_source_order() {
        let raw = vec![raw_coin("btc", 300.0), raw_coin("eth", 200.0), raw_coin("sol", 100.0)];
        let snap = normalize(&raw, 50);
        let ids: Vec<&str> = snap.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["btc", "eth", "sol"]);
        let btc = &snap.records()[0];
        assert_eq!(btc.name, "BTC");
        assert_eq!(btc.symbol, "btc");
        assert_eq!(btc.price, 10.0);
        assert_eq!(btc.volume_24h, 1000.0);
        assert_eq!(btc.change_24h_pct, 1.5);
    }

    #[test]
    fn normalize_drops_incomplete_records() {
        let mut missing = raw_coin("eth", 200.0);
        missing.as_object_mut().unwrap().remove("total_volume");
        let mut null_change = raw_coin("sol", 100.0);
        null_change["price_change_percentage_24h"] = serde_json::Value::Null;

        let snap = normalize(&[raw_coin("btc", 300.0), missing, null_change], 50);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.records()[0].id, "btc");
    }

    #[test]
    fn normalize_accepts_numeric_strings_and_missing_id() {
        let raw = json!({
            "name": "Tether",
            "symbol": "USDT",
            "current_price": "1.0001",
            "market_cap": 100.0,
            "total_volume": 5.0,
            "price_change_percentage_24h": -0.01,
        });
        let snap = normalize(&[raw], 50);
        assert_eq!(snap.records()[0].id, "usdt");
        assert!((snap.records()[0].price - 1.0001).abs() < 1e-12);
    }

    #[test]
    fn normalize_caps_at_page_size() {
        let raw: Vec<_> = (0..60).map(|i| raw_coin(&format!("c{i}"), 1000.0 - i as f64)).collect();
        assert_eq!(normalize(&raw, 50).len(), 50);
    }

    #[test]
    fn scenario_three_coins() {
        let snap = snapshot(vec![
            rec("Bitcoin", 60_000.0, 1_000_000.0, 2.0),
            rec("Ether", 3_000.0, 500_000.0, -12.5),
            rec("Coin3", 1.0, 100_000.0, 20.0),
        ]);
        let s = analyze(&snap, at(12)).unwrap();

        assert_eq!(s.highest_change.name, "Coin3");
        assert_eq!(s.highest_change.change_24h_pct, 20.0);
        assert_eq!(s.lowest_change.name, "Ether");
        assert_eq!(s.lowest_change.change_24h_pct, -12.5);
        assert_eq!(s.total_market_cap, 1_600_000.0);
        assert!((concentration_ratio(&snap, 2) - 93.75).abs() < 1e-9);
        assert_eq!(s.concentration_pct, 100.0);
        assert_eq!(s.coin_count, 3);
        assert_eq!(s.median_price, 3_000.0);
        assert_eq!(s.moves_over_high, 2);
        assert_eq!(s.moves_over_extreme, 2);

        let volatile: Vec<&str> = s.most_volatile.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(volatile, vec!["Coin3", "Ether", "Bitcoin"]);
    }

    #[test]
    fn empty_snapshot_is_a_compute_failure() {
        let err = analyze(&MarketSnapshot::default(), at(0)).unwrap_err();
        assert!(matches!(err, AppError::Compute(_)));
    }

    #[test]
    fn extremes_prefer_first_occurrence() {
        let snap = snapshot(vec![
            rec("First", 1.0, 300.0, 5.0),
            rec("Second", 1.0, 200.0, 5.0),
            rec("Low1", 1.0, 150.0, -5.0),
            rec("Low2", 1.0, 100.0, -5.0),
        ]);
        let s = analyze(&snap, at(0)).unwrap();
        assert_eq!(s.highest_change.name, "First");
        assert_eq!(s.lowest_change.name, "Low1");
        let volatile: Vec<&str> = s.most_volatile.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(volatile, vec!["First", "Second", "Low1"]);
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        let snap = snapshot(vec![
            rec("A", 1.0, 4.0, 0.0),
            rec("B", 2.0, 3.0, 0.0),
            rec("C", 10.0, 2.0, 0.0),
            rec("D", 40.0, 1.0, 0.0),
        ]);
        let s = analyze(&snap, at(0)).unwrap();
        assert_eq!(s.median_price, 6.0);
        assert_eq!(s.mean_price, 13.25);
    }

    #[test]
    fn mean_and_median_stay_within_price_range() {
        let prices = [0.1, 0.1, 0.1, 0.30000000000000004, 67_000.0, 0.000_012];
        for n in 1..=prices.len() {
            let records: Vec<_> = prices[..n]
                .iter()
                .enumerate()
                .map(|(i, p)| rec(&format!("Coin{i}"), *p, 100.0 - i as f64, 0.0))
                .collect();
            let snap = snapshot(records);
            let s = analyze(&snap, at(0)).unwrap();
            let min = prices[..n].iter().copied().fold(f64::INFINITY, f64::min);
            let max = prices[..n].iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert!(s.mean_price >= min && s.mean_price <= max, "mean={} n={n}", s.mean_price);
            assert!(s.median_price >= min && s.median_price <= max, "median={} n={n}", s.median_price);
        }
    }

    #[test]
    fn top_by_market_cap_is_non_increasing_prefix() {
        for n in [1usize, 3, 5, 8] {
            let records: Vec<_> = (0..n)
                .map(|i| rec(&format!("Coin{i}"), 1.0, ((i * 7919) % 13) as f64 * 1000.0, 0.0))
                .collect();
            let s = analyze(&snapshot(records), at(0)).unwrap();
            assert_eq!(s.top_by_market_cap.len(), n.min(5));
            assert!(s
                .top_by_market_cap
                .windows(2)
                .all(|w| w[0].market_cap >= w[1].market_cap));
        }
    }

    #[test]
    fn concentration_is_bounded() {
        let zero = snapshot(vec![rec("A", 1.0, 0.0, 0.0), rec("B", 1.0, 0.0, 0.0)]);
        assert_eq!(concentration_ratio(&zero, 5), 0.0);

        let records: Vec<_> = (0..12).map(|i| rec(&format!("C{i}"), 1.0, (i * i) as f64, 0.0)).collect();
        let r = concentration_ratio(&snapshot(records), 5);
        assert!((0.0..=100.0).contains(&r), "ratio={r}");
    }

    #[test]
    fn analysis_is_deterministic_apart_from_timestamp() {
        let raw: Vec<_> = (0..20).map(|i| raw_coin(&format!("c{i}"), 500.0 - i as f64)).collect();
        let a = analyze(&normalize(&raw, 50), at(1)).unwrap();
        let mut b = analyze(&normalize(&raw, 50), at(2)).unwrap();
        assert_ne!(a.timestamp, b.timestamp);
        b.timestamp = a.timestamp;
        assert_eq!(a, b);
    }
}

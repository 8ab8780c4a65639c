//! Lenient deserialisation for backend counters.
//!
//! The backend is not trusted to send well-typed numbers. Anything that is
//! not a usable non-negative number reads as `0`; nothing here returns an
//! error for a value of the wrong type.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::value::MapAccessDeserializer;
use serde::de::{Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

use crate::{QueueKey, QueueStat};

/// Deserialize a counter, coercing bad input to zero.
pub(crate) fn counter<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CounterVisitor)
}

/// Deserialize the queue map. `null` or a non-object reads as no queues, and
/// a queue whose value is not an object reads as all-zero counters.
pub(crate) fn queues<'de, D>(deserializer: D) -> Result<BTreeMap<QueueKey, QueueStat>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(QueuesVisitor)
}

fn from_f64(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.trunc() as u64
    } else {
        0
    }
}

struct CounterVisitor;

impl<'de> Visitor<'de> for CounterVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a counter")
    }

    fn visit_u64<E>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E>(self, v: i64) -> Result<u64, E> {
        Ok(u64::try_from(v).unwrap_or(0))
    }

    fn visit_f64<E>(self, v: f64) -> Result<u64, E> {
        Ok(from_f64(v))
    }

    fn visit_bool<E>(self, v: bool) -> Result<u64, E> {
        Ok(u64::from(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<u64, E> {
        let v = v.trim();
        if let Ok(n) = v.parse::<u64>() {
            return Ok(n);
        }
        Ok(v.parse::<f64>().map_or(0, from_f64))
    }

    fn visit_unit<E>(self) -> Result<u64, E> {
        Ok(0)
    }

    fn visit_none<E>(self) -> Result<u64, E> {
        Ok(0)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        counter(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<u64, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(0)
    }

    fn visit_map<A>(self, mut map: A) -> Result<u64, A::Error>
    where
        A: MapAccess<'de>,
    {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(0)
    }
}

/// A queue entry that falls back to zeroed counters when it is not an object.
struct MaybeStat(QueueStat);

impl<'de> Deserialize<'de> for MaybeStat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MaybeStatVisitor)
    }
}

struct MaybeStatVisitor;

impl<'de> Visitor<'de> for MaybeStatVisitor {
    type Value = MaybeStat;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue counters")
    }

    fn visit_map<A>(self, map: A) -> Result<MaybeStat, A::Error>
    where
        A: MapAccess<'de>,
    {
        QueueStat::deserialize(MapAccessDeserializer::new(map)).map(MaybeStat)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<MaybeStat, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(MaybeStat(QueueStat::default()))
    }

    fn visit_u64<E>(self, _: u64) -> Result<MaybeStat, E> {
        Ok(MaybeStat(QueueStat::default()))
    }

    fn visit_i64<E>(self, _: i64) -> Result<MaybeStat, E> {
        Ok(MaybeStat(QueueStat::default()))
    }

    fn visit_f64<E>(self, _: f64) -> Result<MaybeStat, E> {
        Ok(MaybeStat(QueueStat::default()))
    }

    fn visit_bool<E>(self, _: bool) -> Result<MaybeStat, E> {
        Ok(MaybeStat(QueueStat::default()))
    }

    fn visit_str<E>(self, _: &str) -> Result<MaybeStat, E> {
        Ok(MaybeStat(QueueStat::default()))
    }

    fn visit_unit<E>(self) -> Result<MaybeStat, E> {
        Ok(MaybeStat(QueueStat::default()))
    }

    fn visit_none<E>(self) -> Result<MaybeStat, E> {
        Ok(MaybeStat(QueueStat::default()))
    }
}

struct QueuesVisitor;

impl<'de> Visitor<'de> for QueuesVisitor {
    type Value = BTreeMap<QueueKey, QueueStat>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of queue counters")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut queues = BTreeMap::new();
        while let Some((key, MaybeStat(stat))) = map.next_entry::<QueueKey, MaybeStat>()? {
            queues.insert(key, stat);
        }
        Ok(queues)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(BTreeMap::new())
    }

    fn visit_u64<E>(self, _: u64) -> Result<Self::Value, E> {
        Ok(BTreeMap::new())
    }

    fn visit_i64<E>(self, _: i64) -> Result<Self::Value, E> {
        Ok(BTreeMap::new())
    }

    fn visit_f64<E>(self, _: f64) -> Result<Self::Value, E> {
        Ok(BTreeMap::new())
    }

    fn visit_bool<E>(self, _: bool) -> Result<Self::Value, E> {
        Ok(BTreeMap::new())
    }

    fn visit_str<E>(self, _: &str) -> Result<Self::Value, E> {
        Ok(BTreeMap::new())
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(BTreeMap::new())
    }

    fn visit_none<E>(self) -> Result<Self::Value, E> {
        Ok(BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Metric, Snapshot};

    fn parse(json: &str) -> Snapshot {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let snapshot = parse(r#"{"timestamp": 10, "queues": {"a": {"queued": 5}}}"#);
        let stat = snapshot.stat("a").unwrap();
        assert_eq!(stat.queued, 5);
        assert_eq!(stat.pending, 0);
        assert_eq!(stat.recommended_concurrency, 0);
    }

    #[test]
    fn test_bad_counters_coerce_to_zero() {
        let snapshot = parse(
            r#"{"timestamp": 10, "queues": {"a": {
                "pending": null, "queued": "12", "running": -4, "success": 7.9,
                "failed": "oops", "retrying": true, "recommended_concurrency": [1]
            }}}"#,
        );
        let stat = snapshot.stat("a").unwrap();
        assert_eq!(stat.pending, 0);
        assert_eq!(stat.queued, 12);
        assert_eq!(stat.running, 0);
        assert_eq!(stat.success, 7);
        assert_eq!(stat.failed, 0);
        assert_eq!(stat.retrying, 1);
        assert_eq!(stat.recommended_concurrency, 0);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let snapshot = parse(r#"{"timestamp": 1, "queues": {"a": {"queued": 2, "extra": {}}}, "v": 3}"#);
        assert_eq!(snapshot.value("a", Metric::Queued), 2);
    }

    #[test]
    fn test_malformed_queue_entries() {
        let snapshot = parse(r#"{"timestamp": "99", "queues": {"a": null, "b": 4, "c": {"failed": 1}}}"#);
        assert_eq!(snapshot.timestamp_ms, 99);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.value("a", Metric::Failed), 0);
        assert_eq!(snapshot.value("b", Metric::Failed), 0);
        assert_eq!(snapshot.value("c", Metric::Failed), 1);
    }

    #[test]
    fn test_missing_or_null_queues() {
        assert!(parse(r#"{"timestamp": 1}"#).is_empty());
        assert!(parse(r#"{"timestamp": 1, "queues": null}"#).is_empty());
        assert!(parse(r#"{"timestamp": 1, "queues": [1, 2]}"#).is_empty());
        assert_eq!(parse("{}").timestamp_ms, 0);
    }
}

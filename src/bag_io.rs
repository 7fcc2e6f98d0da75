//! ROS1 bag access: topic catalogue, restartable per-topic reads, and the
//! `inspect` summary.

use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use rosbag::{ChunkRecord, MessageRecord, RosBag};

/// Connection id -> (topic, message type), collected before any message walk.
pub type Catalogue = BTreeMap<u32, (String, String)>;

pub fn open_bag(path: &str) -> Result<RosBag> {
    RosBag::new(path).with_context(|| format!("failed to open bag: {path}"))
}

/// Materialize all chunk records up front. The rosbag iterator is not
/// restartable, but a collected chunk list can be walked once per topic.
pub fn collect_chunks(bag: &RosBag) -> Result<Vec<ChunkRecord<'_>>> {
    Ok(bag.chunk_records().collect::<Result<Vec<_>, _>>()?)
}

pub fn collect_catalogue(chunks: &[ChunkRecord<'_>]) -> Result<Catalogue> {
    let mut catalogue = Catalogue::new();
    for record in chunks {
        if let ChunkRecord::Chunk(chunk) = record {
            for msg in chunk.messages() {
                if let MessageRecord::Connection(conn) = msg? {
                    catalogue.insert(conn.id, (conn.topic.to_string(), conn.tp.to_string()));
                }
            }
        }
    }
    Ok(catalogue)
}

pub fn topic_set(catalogue: &Catalogue) -> HashSet<String> {
    catalogue.values().map(|(topic, _)| topic.clone()).collect()
}

/// All `(stamp_ns, payload)` messages of one topic, in bag order.
pub fn read_topic<'a>(
    chunks: &'a [ChunkRecord<'a>],
    catalogue: &Catalogue,
    topic: &str,
) -> Result<Vec<(i64, &'a [u8])>> {
    let conn_ids: HashSet<u32> = catalogue
        .iter()
        .filter(|(_, (t, _))| t == topic)
        .map(|(id, _)| *id)
        .collect();

    let mut messages = Vec::new();
    for record in chunks {
        if let ChunkRecord::Chunk(chunk) = record {
            for msg in chunk.messages() {
                if let MessageRecord::MessageData(data) = msg? {
                    if conn_ids.contains(&data.conn_id) {
                        messages.push((data.time as i64, data.data));
                    }
                }
            }
        }
    }
    Ok(messages)
}

/// List topics, types, message counts and time span of a bag.
pub fn inspect_bag(path: &str) -> Result<()> {
    let bag = open_bag(path)?;
    let chunks = collect_chunks(&bag)?;
    let catalogue = collect_catalogue(&chunks)?;

    #[derive(Default)]
    struct Stat {
        ty: String,
        count: u64,
        first_ns: i64,
        last_ns: i64,
    }
    let mut stats: BTreeMap<String, Stat> = BTreeMap::new();
    let mut start_ns = i64::MAX;
    let mut end_ns = i64::MIN;
    let mut total: u64 = 0;

    for record in &chunks {
        if let ChunkRecord::Chunk(chunk) = record {
            for msg in chunk.messages() {
                if let MessageRecord::MessageData(data) = msg? {
                    let Some((topic, ty)) = catalogue.get(&data.conn_id) else {
                        continue;
                    };
                    let t = data.time as i64;
                    let entry = stats.entry(topic.clone()).or_insert_with(|| Stat {
                        ty: ty.clone(),
                        first_ns: t,
                        last_ns: t,
                        ..Stat::default()
                    });
                    entry.count += 1;
                    entry.first_ns = entry.first_ns.min(t);
                    entry.last_ns = entry.last_ns.max(t);
                    start_ns = start_ns.min(t);
                    end_ns = end_ns.max(t);
                    total += 1;
                }
            }
        }
    }

    let to_rel_s = |ns: i64| {
        if start_ns == i64::MAX { 0.0 } else { (ns - start_ns) as f64 / 1e9 }
    };
    let duration = if total > 0 { to_rel_s(end_ns) } else { 0.0 };

    println!("Bag: {path}");
    println!("Duration (s): {:.6}, Total messages: {}\n", duration, total);
    println!("{:<45} {:<35} {:>7} {:>10} {:>10}", "Topic", "Type", "Count", "Start(s)", "End(s)");
    println!("{}", "-".repeat(111));
    for (topic, st) in &stats {
        println!(
            "{:<45} {:<35} {:>7} {:>10.6} {:>10.6}",
            topic,
            st.ty,
            st.count,
            to_rel_s(st.first_ns),
            to_rel_s(st.last_ns)
        );
    }
    Ok(())
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end scenarios exercising a full `Participant` over the
//! `INTRA_PROCESS` transport: one write-path, all QoS state machines, and
//! the WaitSet, wired together the way an application actually uses them.

use std::sync::Arc;
use std::time::Duration;

use hdds::clock::now_ns;
use hdds::entity::{EntityRegistry, ParticipantIdPool};
use hdds::qos::{Durability, History, OwnershipKind, Partition, QoS};
use hdds::waitset::WaitSet;
use hdds::{Condition, HasStatusCondition, Participant, Topic, TransportMode};

fn harness() -> Participant {
    // Wire-level and match/unmatch logging, visible with RUST_LOG set;
    // try_init rather than init since every test in this binary calls it.
    let _ = env_logger::try_init();
    let pool = Arc::new(ParticipantIdPool::new());
    let registry = Arc::new(EntityRegistry::new());
    Participant::new("p", 0, TransportMode::IntraProcess, pool, registry).unwrap()
}

/// S1: intra-process ping: one write, one take, same payload.
#[test]
fn s1_intra_process_ping() {
    let p = harness();
    let topic = Topic::new("HelloTopic", "Hello");
    let writer = p.create_writer(topic.clone(), QoS::default()).unwrap();
    let reader = p.create_reader(topic, QoS::default()).unwrap();

    p.write(&writer, b"Hi\0", b"Hi\0".to_vec(), 0).unwrap();

    let sample = reader.take().unwrap();
    assert_eq!(sample.payload, b"Hi\0".to_vec());
    assert!(matches!(reader.take().unwrap_err(), hdds::Error::NoData));
}

/// S2: KEEP_LAST retention: a late-joining TRANSIENT_LOCAL reader sees
/// only the last 3 of 10 samples written before it existed.
#[test]
fn s2_keep_last_retention_for_a_late_joiner() {
    let p = harness();
    let topic = Topic::new("RetainedTopic", "Reading");
    let mut qos = QoS::reliable();
    qos.durability = Durability::TransientLocal;
    qos.history = History::KeepLast(3);

    let writer = p.create_writer(topic.clone(), qos.clone()).unwrap();
    for i in 1..=10u64 {
        p.write(&writer, b"k", vec![i as u8], i).unwrap();
    }

    let reader = p.create_reader(topic, qos).unwrap();
    assert_eq!(reader.take().unwrap().payload, vec![8]);
    assert_eq!(reader.take().unwrap().payload, vec![9]);
    assert_eq!(reader.take().unwrap().payload, vec![10]);
    assert!(matches!(reader.take().unwrap_err(), hdds::Error::NoData));
}

/// S3: DEADLINE miss: no misses while the publisher keeps up, at least
/// one once it stops.
#[test]
fn s3_deadline_miss_after_the_publisher_stops() {
    let p = harness();
    let topic = Topic::new("DeadlineTopic", "Heartbeat");
    let mut qos = QoS::default();
    qos.deadline.period_ns = 100_000_000; // 100ms

    let writer = p.create_writer(topic.clone(), qos.clone()).unwrap();
    let reader = p.create_reader(topic, qos).unwrap();

    let mut now_ns = 0u64;
    for _ in 0..10 {
        p.write(&writer, b"k", vec![1], now_ns).unwrap();
        now_ns += 50_000_000; // 50ms cadence
        assert!(reader.tick_deadline(now_ns).is_empty());
    }

    // Publisher stops; 200ms later the deadline has been missed.
    now_ns += 200_000_000;
    assert!(!reader.tick_deadline(now_ns).is_empty());
}

/// S4: OWNERSHIP=EXCLUSIVE: the reader follows the higher-strength
/// writer, then fails over once it is destroyed and its lease elapses.
#[test]
fn s4_exclusive_ownership_failover() {
    let p = harness();
    let topic = Topic::new("OwnedTopic", "Reading");
    let mut qos = QoS::default();
    qos.ownership = OwnershipKind::Exclusive;
    qos.liveliness.lease_ns = 50_000_000; // 50ms

    let mut w1_qos = qos.clone();
    w1_qos.ownership_strength = 10;
    let mut w2_qos = qos.clone();
    w2_qos.ownership_strength = 20;

    let w1 = p.create_writer(topic.clone(), w1_qos).unwrap();
    let w2 = p.create_writer(topic.clone(), w2_qos).unwrap();
    let reader = p.create_reader(topic, qos).unwrap();

    // W2 (strength 20) claims the instance first; W1 (strength 10) then
    // arrives too weak to unseat it and is dropped.
    p.write(&w2, b"k", vec![2], now_ns()).unwrap();
    p.write(&w1, b"k", vec![1], now_ns()).unwrap();
    assert_eq!(reader.take().unwrap().payload, vec![2]);
    assert!(matches!(reader.take().unwrap_err(), hdds::Error::NoData));

    // Destroying W2 disposes its SEDP announcement, unmatching it and
    // freeing the instance for arbitration immediately; the liveliness
    // tick below is the fallback path for a writer that vanishes without
    // disposing (a crash, not a clean destroy).
    p.destroy_writer(&w2.guid);
    std::thread::sleep(Duration::from_millis(120));
    reader.tick_liveliness(now_ns());
    p.write(&w1, b"k", vec![3], now_ns()).unwrap();
    assert_eq!(reader.take().unwrap().payload, vec![3]);
}

/// S5: WaitSet wake: no count before a write, a count after, and a guard
/// condition that wakes a further wait.
#[test]
fn s5_waitset_wakes_on_data_then_on_a_guard() {
    let p = harness();
    let topic = Topic::new("WaitTopic", "Ping");
    let writer = p.create_writer(topic.clone(), QoS::default()).unwrap();
    let reader = p.create_reader(topic, QoS::default()).unwrap();
    // Matching itself raised SUBSCRIPTION_MATCHED; clear it so the waitset
    // only reacts to the write that follows.
    reader.status_condition().clear(hdds::waitset::StatusMask::ALL);

    let ws = WaitSet::new();
    ws.attach_condition(reader.status_condition_arc());
    assert!(ws.wait(Duration::from_millis(20)).is_err());

    p.write(&writer, b"k", vec![1], 0).unwrap();
    let triggered = ws.wait(Duration::from_millis(500)).unwrap();
    assert_eq!(triggered, vec![reader.status_condition_arc().condition_id()]);

    let guard = p.graph_guard_condition();
    ws.attach_condition(guard.clone());
    reader.status_condition().clear(hdds::waitset::StatusMask::DATA_AVAILABLE);
    guard.set_trigger_value(true);
    let triggered = ws.wait(Duration::from_millis(500)).unwrap();
    assert_eq!(triggered, vec![guard.condition_id()]);
}

/// S6: partition isolation: disjoint partitions never match; a reader
/// spanning both partitions does.
#[test]
fn s6_partition_isolation_and_overlap() {
    let p = harness();
    let topic = Topic::new("PartitionedTopic", "Reading");
    let mut writer_qos = QoS::default();
    writer_qos.partition = Partition::new(vec!["A".into()]);
    let mut reader_qos = QoS::default();
    reader_qos.partition = Partition::new(vec!["B".into()]);

    let writer = p.create_writer(topic.clone(), writer_qos.clone()).unwrap();
    let isolated_reader = p.create_reader(topic.clone(), reader_qos).unwrap();
    assert_eq!(isolated_reader.matched_writer_count(), 0);
    assert_eq!(writer.matched_reader_count(), 0);

    let mut overlapping_qos = QoS::default();
    overlapping_qos.partition = Partition::new(vec!["A".into(), "B".into()]);
    let overlapping_reader = p.create_reader(topic, overlapping_qos).unwrap();
    assert_eq!(overlapping_reader.matched_writer_count(), 1);
    assert_eq!(writer.matched_reader_count(), 1);
}

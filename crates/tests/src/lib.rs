//! # Integration Tests
//!
//! End-to-end scenarios across the workspace:
//! - Host flush → normalizer → dispatcher → delivery adapter
//! - Retry budget and terminal outcome accounting
//! - Overlapping flushes and registry lifecycle

#[cfg(test)]
mod support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use config_loader::OptionMap;
    use contracts::{ContractError, PutRecordsOutput, RequestEntry, StreamClient};
    use rmpv::Value;

    pub fn encode(entries: &[Value]) -> Vec<u8> {
        let mut buf = Vec::new();
        for entry in entries {
            rmpv::encode::write_value(&mut buf, entry).unwrap();
        }
        buf
    }

    pub fn event_time(secs: u32) -> Value {
        let mut data = secs.to_be_bytes().to_vec();
        data.extend_from_slice(&0u32.to_be_bytes());
        Value::Ext(0, data)
    }

    pub fn entry(timestamp: Value, pairs: Vec<(&str, Value)>) -> Value {
        let record = pairs
            .into_iter()
            .map(|(k, v)| (Value::from(k), v))
            .collect();
        Value::Array(vec![timestamp, Value::Map(record)])
    }

    pub fn options(stream: &str) -> OptionMap {
        OptionMap::new()
            .with("stream", stream)
            .with("region", "us-east-1")
            .with("partition_key", "")
    }

    /// Stream client recording every put; the first `failures` puts fail
    #[derive(Default)]
    pub struct RecordingClient {
        pub puts: Mutex<Vec<(String, Vec<RequestEntry>)>>,
        pub failures: AtomicUsize,
    }

    impl RecordingClient {
        pub fn failing(failures: usize) -> Self {
            Self {
                failures: AtomicUsize::new(failures),
                ..Self::default()
            }
        }

        pub fn puts(&self) -> Vec<(String, Vec<RequestEntry>)> {
            self.puts.lock().unwrap().clone()
        }
    }

    impl StreamClient for RecordingClient {
        async fn put_records(
            &self,
            stream: &str,
            entries: &[RequestEntry],
        ) -> Result<PutRecordsOutput, ContractError> {
            self.puts
                .lock()
                .unwrap()
                .push((stream.to_string(), entries.to_vec()));

            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(ContractError::delivery_retryable(stream, "throughput exceeded"));
            }
            Ok(PutRecordsOutput::default())
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::{DateTime, Utc};
    use contracts::{
        ContractError, DeliveryAdapter, FlushOutcome, InstanceId, LogValue, OutputConfig, Record,
        RequestBuffer,
    };
    use dispatcher::{DispatcherConfig, StreamAdapter};
    use plugin::{HostContext, OutputPlugin, PluginContext};
    use rmpv::Value;
    use tokio::runtime::Handle;
    use tokio::sync::Notify;

    use crate::support::{encode, entry, event_time, options, RecordingClient};

    /// Adapter whose flush waits for the test to open the gate
    struct GatedAdapter {
        gate: Arc<Notify>,
        added: Mutex<Vec<(Record, DateTime<Utc>)>>,
        flushes: AtomicUsize,
    }

    impl DeliveryAdapter for GatedAdapter {
        fn name(&self) -> &str {
            "gated"
        }

        async fn add_record(
            &self,
            _buffer: &mut RequestBuffer,
            record: &Record,
            timestamp: DateTime<Utc>,
        ) -> FlushOutcome {
            self.added.lock().unwrap().push((record.clone(), timestamp));
            FlushOutcome::Ok
        }

        async fn flush(&self, _buffer: &mut RequestBuffer) -> FlushOutcome {
            self.gate.notified().await;
            self.flushes.fetch_add(1, Ordering::SeqCst);
            FlushOutcome::Ok
        }
    }

    fn recording_adapter(
        config: &OutputConfig,
        id: InstanceId,
    ) -> Result<StreamAdapter<RecordingClient>, ContractError> {
        Ok(StreamAdapter::from_config(config, id, RecordingClient::default()))
    }

    async fn wait_for(condition: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    /// One record at epoch second 1000000000, flushed through the host entry
    /// point: the host sees OK before delivery finishes.
    #[tokio::test]
    async fn test_single_record_flush_returns_before_delivery() {
        let gate = Arc::new(Notify::new());
        let adapter_gate = Arc::clone(&gate);
        let plugin = OutputPlugin::new(
            move |_: &OutputConfig, _: InstanceId| {
                Ok::<_, ContractError>(GatedAdapter {
                    gate: Arc::clone(&adapter_gate),
                    added: Mutex::default(),
                    flushes: AtomicUsize::new(0),
                })
            },
            DispatcherConfig::default(),
            Handle::current(),
        );
        let mut ctx = PluginContext::new(options("s"));
        assert_eq!(plugin.init(&mut ctx), FlushOutcome::Ok);
        assert_eq!(ctx.instance_id(), Some(InstanceId(0)));

        let data = encode(&[entry(
            Value::from(1_000_000_000u64),
            vec![("a", Value::from(1))],
        )]);
        let batch = normalizer::normalize_msgpack(&data);
        assert_eq!(batch.count(), 1);
        assert_eq!(
            batch.records[0].timestamp.to_rfc3339(),
            "2001-09-09T01:46:40+00:00"
        );

        assert_eq!(plugin.flush(&ctx, &data, "app"), FlushOutcome::Ok);
        assert_eq!(plugin.dispatcher().in_flight(), 1);

        tokio::task::yield_now().await;
        let instance = plugin.registry().get(InstanceId(0)).unwrap();
        assert_eq!(instance.adapter.flushes.load(Ordering::SeqCst), 0);

        gate.notify_one();
        let metrics = Arc::clone(plugin.dispatcher().metrics());
        wait_for(|| metrics.delivered() == 1).await;

        let added = instance.adapter.added.lock().unwrap().clone();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].0.get("a"), Some(&LogValue::UInt(1)));
        assert_eq!(added[0].1.to_rfc3339(), "2001-09-09T01:46:40+00:00");
        assert_eq!(instance.adapter.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.attempts(), 1);
        assert_eq!(plugin.exit(), FlushOutcome::Ok);
    }

    #[tokio::test]
    async fn test_stream_payload_shaping() {
        let plugin = OutputPlugin::new(
            recording_adapter,
            DispatcherConfig::default(),
            Handle::current(),
        );
        let mut ctx = PluginContext::new(
            options("logs")
                .with("partition_key", "kubernetes->pod")
                .with("data_keys", "log,kubernetes")
                .with("time_key", "ts")
                .with("time_key_format", "%Y")
                .with("append_newline", "TRUE"),
        );
        assert_eq!(plugin.init(&mut ctx), FlushOutcome::Ok);

        let data = encode(&[entry(
            event_time(1_000_000_000),
            vec![
                ("log", Value::from("hello")),
                ("level", Value::from("info")),
                (
                    "kubernetes",
                    Value::Map(vec![(Value::from("pod"), Value::from("web-1"))]),
                ),
            ],
        )]);
        let report = plugin
            .flush_tracked(&ctx, &data, "kube.app")
            .unwrap()
            .await
            .unwrap();
        assert_eq!(report.outcome, FlushOutcome::Ok);

        let instance = plugin.registry().get(InstanceId(0)).unwrap();
        let puts = instance.adapter.client().puts();
        assert_eq!(puts.len(), 1);
        let (stream, entries) = &puts[0];
        assert_eq!(stream, "logs");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].partition_key, "web-1");
        assert!(entries[0].data.ends_with(b"\n"));

        let payload: serde_json::Value = serde_json::from_slice(&entries[0].data).unwrap();
        assert_eq!(payload["log"], "hello");
        assert_eq!(payload["kubernetes"]["pod"], "web-1");
        assert_eq!(payload["ts"], "2001");
        assert!(payload.get("level").is_none());
    }

    #[tokio::test]
    async fn test_retries_exhausted_is_reported() {
        let plugin = OutputPlugin::new(
            |config: &OutputConfig, id: InstanceId| {
                Ok::<_, ContractError>(StreamAdapter::from_config(
                    config,
                    id,
                    RecordingClient::failing(usize::MAX),
                ))
            },
            DispatcherConfig::default(),
            Handle::current(),
        );
        let mut ctx = PluginContext::new(options("s"));
        plugin.init(&mut ctx);

        let data = encode(&[entry(Value::from(1u64), vec![("a", Value::from(1))])]);
        let report = plugin
            .flush_tracked(&ctx, &data, "app")
            .unwrap()
            .await
            .unwrap();

        assert_eq!(report.outcome, FlushOutcome::Retry);
        assert_eq!(report.attempts, 2);
        assert!(report.retries_exhausted());
        let instance = plugin.registry().get(InstanceId(0)).unwrap();
        assert_eq!(instance.adapter.client().puts().len(), 2);
        assert_eq!(plugin.dispatcher().metrics().retries_exhausted(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers_on_retry() {
        let plugin = OutputPlugin::new(
            |config: &OutputConfig, id: InstanceId| {
                Ok::<_, ContractError>(StreamAdapter::from_config(
                    config,
                    id,
                    RecordingClient::failing(1),
                ))
            },
            DispatcherConfig::default(),
            Handle::current(),
        );
        let mut ctx = PluginContext::new(options("s"));
        plugin.init(&mut ctx);

        let data = encode(&[
            entry(Value::from(1u64), vec![("seq", Value::from(1))]),
            entry(Value::from(2u64), vec![("seq", Value::from(2))]),
        ]);
        let report = plugin
            .flush_tracked(&ctx, &data, "app")
            .unwrap()
            .await
            .unwrap();

        assert_eq!(report.outcome, FlushOutcome::Ok);
        assert_eq!(report.attempts, 2);
        let instance = plugin.registry().get(InstanceId(0)).unwrap();
        let puts = instance.adapter.client().puts();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[1].1.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_batch_delivers_decoded_prefix() {
        let plugin = OutputPlugin::new(
            recording_adapter,
            DispatcherConfig::default(),
            Handle::current(),
        );
        let mut ctx = PluginContext::new(options("s"));
        plugin.init(&mut ctx);

        let mut data = encode(&[
            entry(Value::from(1u64), vec![("seq", Value::from(1))]),
            entry(Value::from(2u64), vec![("seq", Value::from(2))]),
        ]);
        let tail = encode(&[entry(
            Value::from(3u64),
            vec![("seq", Value::from("three, truncated"))],
        )]);
        data.extend_from_slice(&tail[..tail.len() / 2]);

        let batch = normalizer::normalize_msgpack(&data);
        assert_eq!(batch.count(), 2);
        assert!(batch.decode_error.is_some());

        let report = plugin
            .flush_tracked(&ctx, &data, "app")
            .unwrap()
            .await
            .unwrap();

        assert_eq!(report.outcome, FlushOutcome::Ok);
        assert_eq!(report.records, 2);
        let instance = plugin.registry().get(InstanceId(0)).unwrap();
        assert_eq!(instance.adapter.client().puts()[0].1.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_flushes_do_not_mix_records() {
        let plugin = OutputPlugin::new(
            recording_adapter,
            DispatcherConfig::default(),
            Handle::current(),
        );
        let mut ctx = PluginContext::new(options("s"));
        plugin.init(&mut ctx);

        let batch = |range: std::ops::Range<u64>| {
            let entries: Vec<Value> = range
                .map(|seq| entry(Value::from(seq), vec![("seq", Value::from(seq))]))
                .collect();
            encode(&entries)
        };
        let first = plugin.flush_tracked(&ctx, &batch(0..200), "a").unwrap();
        let second = plugin.flush_tracked(&ctx, &batch(10_000..10_200), "b").unwrap();
        assert_eq!(first.await.unwrap().outcome, FlushOutcome::Ok);
        assert_eq!(second.await.unwrap().outcome, FlushOutcome::Ok);

        let instance = plugin.registry().get(InstanceId(0)).unwrap();
        let puts = instance.adapter.client().puts();
        assert_eq!(puts.len(), 2);
        for (_, entries) in &puts {
            assert_eq!(entries.len(), 200);
            let seqs: Vec<u64> = entries
                .iter()
                .map(|e| {
                    let payload: serde_json::Value = serde_json::from_slice(&e.data).unwrap();
                    payload["seq"].as_u64().unwrap()
                })
                .collect();
            let low = seqs.iter().all(|&s| s < 10_000);
            let high = seqs.iter().all(|&s| s >= 10_000);
            assert!(low || high, "records of two flushes mixed in one buffer");
        }
    }
}

#[cfg(test)]
mod registry_tests {
    use contracts::{ContractError, InstanceId, OutputConfig};
    use registry::InstanceRegistry;

    use crate::support::options;

    fn unit(_: &OutputConfig, _: InstanceId) -> Result<(), ContractError> {
        Ok(())
    }

    #[test]
    fn test_valid_configurations_get_increasing_ids() {
        let registry = InstanceRegistry::new();
        let ids: Vec<InstanceId> = (0..5)
            .map(|i| registry.create(&options(&format!("s{i}")), unit).unwrap())
            .collect();

        assert_eq!(ids, (0..5).map(InstanceId).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_configurations_leave_registry_unchanged() {
        let registry = InstanceRegistry::new();
        registry.create(&options("s"), unit).unwrap();

        let invalid = [
            options("").with("region", "us-east-1"),
            options("s").with("region", ""),
            options("s").with("partition_key", "log"),
            options("s")
                .with("time_key", "ts")
                .with("time_key_format", "%Y-%m-%d %Q"),
        ];
        for source in &invalid {
            assert!(registry.create(source, unit).is_err());
            assert_eq!(registry.len(), 1);
        }

        assert_eq!(registry.create(&options("t"), unit).unwrap(), InstanceId(1));
    }
}

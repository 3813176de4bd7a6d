#![cfg(test)]

pub const HTTP_REQUESTS: &str = r#"
# HELP http_requests_total The total number of HTTP requests.
# TYPE http_requests_total counter
http_requests_total{method="post",code="200"} 1027 1395066363000
http_requests_total{method="post",code="400"}    3 1395066363000

# TYPE memory_usage gauge
memory_usage 5264384
"#;

pub const VALIDATOR: &str = r#"
# HELP validator_balance current validator balance.
# TYPE validator_balance gauge
validator_balance{pubkey="0x8a1f"} 32.004512
validator_balance{pubkey="0x93c2"} 31.998871
# HELP validator_statuses validator statuses: 0 UNKNOWN, 1 DEPOSITED, 2 PENDING, 3 ACTIVE, 4 EXITING, 5 SLASHING, 6 EXITED
# TYPE validator_statuses gauge
validator_statuses{pubkey="0x8a1f"} 3
# HELP process_cpu_seconds_total Total user and system CPU time spent in seconds.
# TYPE process_cpu_seconds_total counter
process_cpu_seconds_total 1842.37
# HELP process_resident_memory_bytes Resident memory size in bytes.
# TYPE process_resident_memory_bytes gauge
process_resident_memory_bytes 2.81391104e+08
# HELP go_goroutines Number of goroutines that currently exist.
# TYPE go_goroutines gauge
go_goroutines 87
# HELP validator_successful_attestations Count the number of successful attestations.
# TYPE validator_successful_attestations counter
validator_successful_attestations{pubkey="0x8a1f"} 12043
validator_successful_attestations{pubkey="0x93c2"} 11987
beacon_head_slot 4201337
"#;

pub const HISTOGRAM: &str = r#"
# HELP request_duration_seconds Request latency.
# TYPE request_duration_seconds histogram
request_duration_seconds_bucket{le="0.1"} 12
request_duration_seconds_bucket{le="1"} 40
request_duration_seconds_bucket{le="+Inf"} 42
request_duration_seconds_sum 17.5
request_duration_seconds_count 42
# TYPE rpc_latency summary
rpc_latency{quantile="0.5"} 0.012
rpc_latency_sum 3.2
rpc_latency_count 210
"#;

pub const GAUGE_ONE_LABEL: &str = r#"
# TYPE foo gauge
foo{job="x"} 3.5
"#;

pub const COUNTER_TWO_INSTANCES: &str = r#"
# TYPE bar counter
bar{inst="1"} 10
bar{inst="2"} 20
"#;

pub const MALFORMED: &str = r#"
# TYPE memory_usage_bytes gauge
memory_usage_bytes{process="test"} foobar
"#;

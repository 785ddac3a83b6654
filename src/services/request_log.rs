// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bounded in-memory request log for diagnostics.
//!
//! Not durable: entries are lost on restart. At capacity the oldest entry
//! is evicted.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One logged request outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestLogEntry {
    pub timestamp: String,
    pub method: String,
    pub path: String,
    /// Outcome label, e.g. `AUTH_SUCCESS` or `INVALID_TOKEN`
    pub status: String,
    /// HTTP status code returned
    pub code: u16,
    pub ip: String,
}

/// Fixed-capacity ring buffer shared through `AppState`.
pub struct RequestLog {
    entries: Mutex<VecDeque<RequestLogEntry>>,
    capacity: usize,
}

impl RequestLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn record(&self, entry: RequestLogEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Entries oldest first.
    pub fn snapshot(&self) -> Vec<RequestLogEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn entry(n: usize) -> RequestLogEntry {
        RequestLogEntry {
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            method: "GET".to_string(),
            path: format!("/api/v1/files/{n}"),
            status: "AUTH_SUCCESS".to_string(),
            code: 200,
            ip: "127.0.0.1".to_string(),
        }
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let log = RequestLog::new(3);
        for n in 0..5 {
            log.record(entry(n));
        }

        let paths: Vec<String> = log.snapshot().into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec!["/api/v1/files/2", "/api/v1/files/3", "/api/v1/files/4"]
        );
    }

    #[test]
    fn zero_capacity_records_nothing() {
        let log = RequestLog::new(0);
        log.record(entry(1));
        assert!(log.is_empty());
    }

    #[test]
    fn concurrent_writers_never_exceed_capacity() {
        let log = Arc::new(RequestLog::new(100));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for n in 0..500 {
                        log.record(entry(t * 1000 + n));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.len(), 100);
    }
}

//! ## pktswarm-handlers::pipeline
//! **Fan-out to handlers and per-interval aggregation**

use std::fmt;

use chrono::{DateTime, Utc};
use pktswarm_protocols::DecodedPacket;
use tracing::debug;

use crate::handler::Handler;
use crate::report::Report;

/// Width every header and row field is right-justified to.
pub const COLUMN_WIDTH: usize = 10;

/// Handlers in registration order.
pub struct Pipeline {
    handlers: Vec<Box<dyn Handler>>,
}

impl Pipeline {
    pub fn new(handlers: Vec<Box<dyn Handler>>) -> Self {
        Self { handlers }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn read_packet(&mut self, packet: &DecodedPacket) {
        for handler in &mut self.handlers {
            handler.read_packet(packet);
        }
    }

    /// Closes every handler's window and bundles the reports.
    pub fn aggregate(&mut self) -> Message {
        let reports: Vec<Report> = self.handlers.iter_mut().map(|h| h.make_report()).collect();
        debug!(reports = reports.len(), "Aggregated handler reports");
        Message::new(reports)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("handlers", &self.names())
            .finish()
    }
}

/// Everything published for one reporting interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub created: DateTime<Utc>,
    pub reports: Vec<Report>,
    /// Live flows at publish time, when flow tracking is on.
    pub active_flows: Option<usize>,
}

impl Message {
    pub fn new(reports: Vec<Report>) -> Self {
        Self {
            created: Utc::now(),
            reports,
            active_flows: None,
        }
    }

    pub fn with_active_flows(mut self, flows: usize) -> Self {
        self.active_flows = Some(flows);
        self
    }

    pub fn header(&self) -> String {
        let mut fields: Vec<String> = self.reports.iter().flat_map(Report::header).collect();
        if self.active_flows.is_some() {
            fields.push("Flows".to_string());
        }
        justify(&fields)
    }

    pub fn line(&self) -> String {
        let mut fields: Vec<String> = self.reports.iter().flat_map(Report::row).collect();
        if let Some(flows) = self.active_flows {
            fields.push(flows.to_string());
        }
        justify(&fields)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.created.format("%Y-%m-%d %H:%M:%S%.3f"))?;
        for report in &self.reports {
            writeln!(f, "{}:", report.title())?;
            writeln!(f, "{report}")?;
        }
        if let Some(flows) = self.active_flows {
            writeln!(f, "active flows = {flows}")?;
        }
        Ok(())
    }
}

fn justify(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| format!("{field:>width$}", width = COLUMN_WIDTH))
        .collect::<Vec<_>>()
        .join(" ")
}

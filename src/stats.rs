use std::io::Write;

use tracing::warn;

use crate::clustering::Centers;
use crate::error::FairKMedianError;
use crate::feasibility::FeasibleAssignment;
use crate::types::{Cost, DurationInSec, PointCount};

/// Memory of the process in MiB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemorySnapshot {
    pub peak_memory: f64,
    pub virtual_memory: f64,
}

/// Inspects the memory of the running process.
pub trait ResourceProbe {
    fn snapshot(&self) -> Result<MemorySnapshot, FairKMedianError>;
}

/// Reads the high-water mark of the resident set (VmHWM) and the virtual size (VmSize) from
/// /proc/self/status. Only available on Linux.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcStatusProbe;

/// A probe for hosts without memory introspection. Always unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProbe;

fn parse_status_kib(status: &str, key: &str) -> Option<f64> {
    status
        .lines()
        .find(|line| line.starts_with(key) && line[key.len()..].starts_with(':'))
        .and_then(|line| line[key.len() + 1..].split_whitespace().next())
        .and_then(|value| value.parse::<f64>().ok())
}

impl ResourceProbe for ProcStatusProbe {
    fn snapshot(&self) -> Result<MemorySnapshot, FairKMedianError> {
        let status = std::fs::read_to_string("/proc/self/status")
            .map_err(|e| FairKMedianError::ResourceProbeUnavailable(format!("/proc/self/status: {}", e)))?;
        let field = |key: &str| {
            parse_status_kib(&status, key)
                .map(|kib| kib / 1024.0)
                .ok_or_else(|| FairKMedianError::ResourceProbeUnavailable(format!("{} missing in /proc/self/status", key)))
        };
        Ok(MemorySnapshot {
            peak_memory: field("VmHWM")?,
            virtual_memory: field("VmSize")?,
        })
    }
}

impl ResourceProbe for NoProbe {
    fn snapshot(&self) -> Result<MemorySnapshot, FairKMedianError> {
        Err(FairKMedianError::ResourceProbeUnavailable(
            "no memory introspection on this host".to_string(),
        ))
    }
}

/// Takes a snapshot; an unavailable probe only degrades the report.
pub fn probe_memory(probe: &dyn ResourceProbe) -> Option<MemorySnapshot> {
    match probe.snapshot() {
        Ok(snapshot) => Some(snapshot),
        Err(error) => {
            warn!("{}; memory is reported as unavailable", error);
            None
        }
    }
}

/// Statistics of one fair k-median run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub feasibility_time: DurationInSec,
    pub coreset_time: DurationInSec,
    pub fpt_3apx_time: DurationInSec,
    pub total_time: DurationInSec,
    /// None if the process memory could not be inspected.
    pub memory: Option<MemorySnapshot>,
    pub nof_solutions: PointCount,
    pub threshold: PointCount,
    /// true if the tiered threshold was 0 for a non-empty pool and had to be raised.
    pub threshold_raised: bool,
    /// Best true cost over all sampled candidates.
    pub cost: Cost,
    /// Cost of unconstrained local search, for comparison only.
    pub opt_ls_cost: Cost,
    pub best_assignment: FeasibleAssignment,
    pub best_centers: Centers,
}

impl RunStats {
    /// The one-line summary of the run.
    pub fn summary_line(&self) -> String {
        let memory = match self.memory {
            Some(m) => format!("[memory: {:.2}MB peak {:.2}MB virtual]", m.peak_memory, m.virtual_memory),
            None => "[memory: unavailable]".to_string(),
        };
        format!(
            "ES+FPT-3APX: [{:.2}s {:.2}s {:.2}s] [total-time: {:.2}s] [cost: {:.6}] [baseline: {:.6}] [solutions: {} sampled: {}{}] {}",
            self.feasibility_time,
            self.coreset_time,
            self.fpt_3apx_time,
            self.total_time,
            self.cost,
            self.opt_ls_cost,
            self.nof_solutions,
            self.threshold,
            if self.threshold_raised { " (raised)" } else { "" },
            memory
        )
    }

    /// Writes the summary line to sink and flushes it.
    pub fn report<W: Write + ?Sized>(&self, sink: &mut W) -> std::io::Result<()> {
        writeln!(sink, "{}", self.summary_line())?;
        sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(memory: Option<MemorySnapshot>) -> RunStats {
        RunStats {
            feasibility_time: 0.012,
            coreset_time: 0.5,
            fpt_3apx_time: 1.234,
            total_time: 1.75,
            memory,
            nof_solutions: 84,
            threshold: 8,
            threshold_raised: false,
            cost: 0.8125,
            opt_ls_cost: 0.75,
            best_assignment: vec![1, 2],
            best_centers: Centers::from_rows(&[vec![0.0], vec![1.0], vec![2.0]], 1).unwrap(),
        }
    }

    #[test]
    fn summary_line_format() {
        let line = stats(Some(MemorySnapshot {
            peak_memory: 3.5,
            virtual_memory: 120.0,
        }))
        .summary_line();
        assert_eq!(
            line,
            "ES+FPT-3APX: [0.01s 0.50s 1.23s] [total-time: 1.75s] [cost: 0.812500] [baseline: 0.750000] [solutions: 84 sampled: 8] [memory: 3.50MB peak 120.00MB virtual]"
        );
        let line = stats(None).summary_line();
        assert!(line.ends_with("[memory: unavailable]"));
    }

    #[test]
    fn report_writes_exactly_one_line() {
        let mut sink: Vec<u8> = Vec::new();
        stats(None).report(&mut sink).unwrap();
        let text = String::from_utf8(sink).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn parses_proc_status() {
        let status = "Name:\tcargo\nVmPeak:\t  20000 kB\nVmSize:\t   10240 kB\nVmHWM:\t    2048 kB\n";
        assert_eq!(parse_status_kib(status, "VmSize"), Some(10240.0));
        assert_eq!(parse_status_kib(status, "VmHWM"), Some(2048.0));
        assert_eq!(parse_status_kib(status, "VmRSS"), None);
    }

    #[test]
    fn unavailable_probe_is_not_fatal() {
        assert!(matches!(NoProbe.snapshot(), Err(FairKMedianError::ResourceProbeUnavailable(_))));
        assert_eq!(probe_memory(&NoProbe), None);
    }
}

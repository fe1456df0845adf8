use std::fmt;

use futures_util::future::join_all;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::probe::{Probe, ProbeContext, ProbeResult, Transcript};

const RULE: &str = "============================================================";

#[derive(Debug)]
pub struct ProbeReport {
    pub probe: Probe,
    pub transcript: Transcript,
    pub outcome: ProbeResult,
}

impl ProbeReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "🔍 {}", self.probe.heading())?;
        for line in self.transcript.lines() {
            writeln!(f, "   {line}")?;
        }
        match &self.outcome {
            Ok(()) => writeln!(f, "   ✅ {} passed", self.probe.title()),
            Err(e) => writeln!(f, "   ❌ {} failed - {e}", self.probe.title()),
        }
    }
}

/// Reports in invocation order.
#[derive(Debug)]
pub struct Summary {
    pub target: String,
    pub reports: Vec<ProbeReport>,
}

impl Summary {
    pub fn passed(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }

    pub fn verdict(&self, probe: Probe) -> Option<bool> {
        self.reports
            .iter()
            .find(|r| r.probe == probe)
            .map(ProbeReport::passed)
    }

    /// Process exit status: 0 when every probe passed, 1 otherwise.
    pub fn exit_status(&self) -> u8 {
        if self.all_passed() { 0 } else { 1 }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.reports {
            writeln!(f, "{report}")?;
        }
        writeln!(f, "{RULE}")?;
        writeln!(f, "📊 TEST RESULTS SUMMARY")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Target: {}", self.target)?;
        for report in &self.reports {
            let marker = if report.passed() {
                "✅ PASSED"
            } else {
                "❌ FAILED"
            };
            writeln!(f, "{}: {marker}", report.probe.title())?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Overall Result: {}/{} tests passed",
            self.passed(),
            self.total()
        )?;
        if self.all_passed() {
            writeln!(f, "🎉 All backend tests passed successfully!")
        } else {
            writeln!(f, "⚠️  Some backend tests failed - see details above")
        }
    }
}

pub fn banner(api_base: &str) -> String {
    format!("{RULE}\n🚀 BACKEND API SMOKE TEST\n{RULE}\nTesting Backend URL: {api_base}\n")
}

pub async fn run_probe(ctx: &ProbeContext, probe: Probe) -> ProbeReport {
    let mut transcript = Transcript::default();
    let outcome = probe
        .run(ctx, &mut transcript)
        .instrument(info_span!("probe", name = probe.name()))
        .await;
    match &outcome {
        Ok(()) => debug!("{probe} passed"),
        Err(e) if e.is_network() => warn!("{probe} could not reach the backend: {e}"),
        Err(e) => warn!("{probe} failed: {e}"),
    }
    ProbeReport {
        probe,
        transcript,
        outcome,
    }
}

/// Runs every probe exactly once. A failing probe never stops the others.
pub async fn run_suite(ctx: &ProbeContext, concurrent: bool) -> Summary {
    info!("Running {} probes against {}", Probe::ALL.len(), ctx.target.api_base);
    let reports = if concurrent {
        join_all(Probe::ALL.into_iter().map(|probe| run_probe(ctx, probe))).await
    } else {
        let mut reports = Vec::with_capacity(Probe::ALL.len());
        for probe in Probe::ALL {
            reports.push(run_probe(ctx, probe).await);
        }
        reports
    };
    let summary = Summary {
        target: ctx.target.api_base.clone(),
        reports,
    };
    info!("{}/{} probes passed", summary.passed(), summary.total());
    summary
}

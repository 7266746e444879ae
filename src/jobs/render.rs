//! Progress display for job monitoring

use std::io::Write;

use colored::Colorize;

use crate::error::Result;
use crate::jobs::models::JobSummary;

/// Renders one update per poll tick
pub trait ProgressRenderer: Send {
    /// Called for every fetched snapshot, including the final one
    fn tick(&mut self, job_id: u64, summary: &JobSummary) -> Result<()>;

    /// Called once when monitoring stops without a job failure
    fn finish(&mut self, job_id: u64, summary: &JobSummary) -> Result<()>;

    /// Called once before a job failure is reported
    fn failure(&mut self, job_id: u64, summary: &JobSummary) -> Result<()>;
}

/// Pick the renderer for the current output
pub fn select_renderer(is_tty: bool, out: Box<dyn Write + Send>) -> Box<dyn ProgressRenderer> {
    if is_tty {
        Box::new(TtyRenderer::new(out))
    } else {
        Box::new(LineRenderer::new(out))
    }
}

/// Rewrites a single status line in place
pub struct TtyRenderer<W> {
    out: W,
    longest: usize,
    frame: usize,
}

impl<W: Write> TtyRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            longest: 0,
            frame: 0,
        }
    }

    fn clear_line(&mut self) -> Result<()> {
        if self.longest > 0 {
            write!(self.out, "\r{}\r", " ".repeat(self.longest))?;
            self.longest = 0;
        }
        Ok(())
    }
}

impl<W: Write + Send> ProgressRenderer for TtyRenderer<W> {
    fn tick(&mut self, _job_id: u64, summary: &JobSummary) -> Result<()> {
        let dots = ".".repeat(self.frame % 4);
        self.frame += 1;

        let mut line = format!("Current status: {}{}", summary.status, dots);
        if line.len() < self.longest {
            line.push_str(&" ".repeat(self.longest - line.len()));
        } else {
            self.longest = line.len();
        }

        write!(self.out, "\r{}", line)?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self, _job_id: u64, _summary: &JobSummary) -> Result<()> {
        self.clear_line()?;
        self.out.flush()?;
        Ok(())
    }

    fn failure(&mut self, job_id: u64, summary: &JobSummary) -> Result<()> {
        self.clear_line()?;
        let notice = format!("Job {} failed (status: {}).", job_id, summary.status);
        writeln!(self.out, "{}", notice.red().bold())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Emits one line per tick, suitable for logs and redirected output
pub struct LineRenderer<W> {
    out: W,
}

impl<W: Write> LineRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> ProgressRenderer for LineRenderer<W> {
    fn tick(&mut self, job_id: u64, summary: &JobSummary) -> Result<()> {
        writeln!(
            self.out,
            "Job {}: {} (elapsed {:.2}s)",
            job_id, summary.status, summary.elapsed
        )?;
        Ok(())
    }

    fn finish(&mut self, _job_id: u64, _summary: &JobSummary) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn failure(&mut self, job_id: u64, summary: &JobSummary) -> Result<()> {
        writeln!(self.out, "Job {} failed (status: {}).", job_id, summary.status)?;
        self.out.flush()?;
        Ok(())
    }
}

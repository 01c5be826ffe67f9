use indicatif::{ProgressBar, ProgressStyle};
use wavethumb::{PipelineEvent, PipelineListener, Stage};

/// CLI progress bar that tracks analyzed columns.
pub struct CliListener {
    pb: ProgressBar,
}

impl CliListener {
    pub fn new(columns: u32) -> Self {
        let pb = ProgressBar::new(columns as u64);
        pb.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} columns ({eta})")
                .unwrap()
                .progress_chars("=>-"),
        );
        Self { pb }
    }
}

impl PipelineListener for CliListener {
    fn on_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::ColumnAnalyzed { .. } => self.pb.inc(1),
            PipelineEvent::StageCompleted(Stage::Done) => self.pb.finish_with_message("done"),
            PipelineEvent::Failed { .. } => self.pb.abandon(),
            _ => {}
        }
    }
}

//! Download ledger for tabshell.
//!
//! Tracks in-flight and finished downloads, newest first. Tasks are keyed
//! by `start_time`; updates for a task that vanished are dropped silently
//! because progress events race with user dismissal.

use crate::types::{DownloadProgress, DownloadTask};

pub struct DownloadLedger {
    tasks: Vec<DownloadTask>,
}

impl DownloadLedger {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    fn find_index(&self, start_time: i64) -> Option<usize> {
        self.tasks.iter().position(|t| t.start_time == start_time)
    }

    /// Registers a freshly started download at the front of the list.
    pub fn create(&mut self, task: DownloadTask) {
        log::debug!("download: started {} ({})", task.name, task.start_time);
        self.tasks.insert(0, task);
    }

    /// Applies a progress event to the matching task, if it still exists.
    pub fn update_progress(&mut self, progress: DownloadProgress) {
        let Some(index) = self.find_index(progress.start_time) else {
            log::trace!("download: progress for unknown task {}", progress.start_time);
            return;
        };
        let task = &mut self.tasks[index];
        task.received_bytes = progress.received_bytes;
        task.save_path = progress.save_path;
        task.is_paused = progress.is_paused;
        task.can_resume = progress.can_resume;
        task.data_state = progress.data_state;
    }

    /// Finalizes a finished download. A task that never got a save path was
    /// cancelled before a destination was chosen and is dropped outright;
    /// otherwise the task is updated in place.
    pub fn complete(&mut self, start_time: i64, name: &str, data_state: &str) {
        let Some(index) = self.find_index(start_time) else {
            return;
        };
        if self.tasks[index].save_path.is_some() {
            self.tasks[index].name = name.to_string();
            self.tasks[index].data_state = data_state.to_string();
        } else {
            self.tasks.remove(index);
        }
    }

    /// Marks every task hidden; used when the shell dismisses the download
    /// bar without forgetting the tasks.
    pub fn hide_all(&mut self) {
        for task in &mut self.tasks {
            task.style = "hidden".to_string();
        }
    }

    /// Replaces the whole list (session restore).
    pub fn replace(&mut self, tasks: Vec<DownloadTask>) {
        self.tasks = tasks;
    }

    pub fn tasks(&self) -> &[DownloadTask] {
        &self.tasks
    }

    pub fn get(&self, start_time: i64) -> Option<&DownloadTask> {
        self.tasks.iter().find(|t| t.start_time == start_time)
    }
}

impl Default for DownloadLedger {
    fn default() -> Self {
        Self::new()
    }
}

//! Presentation of pipeline progress and artifacts.

use crate::orchestrator::Stage;
use image::DynamicImage;
use std::sync::{Arc, Mutex};

pub trait DisplaySink: Send + Sync {
    fn stage_changed(&self, stage: Stage);
    /// Called as soon as the dialogue is ready, before scene work starts.
    fn show_dialogue(&self, dialogue: &str);
    /// Receives the image already fitted to the display bounds.
    fn show_image(&self, image: &DynamicImage);
    fn status(&self, message: &str);
}

/// Writes everything to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleDisplay;

impl DisplaySink for ConsoleDisplay {
    fn stage_changed(&self, stage: Stage) {
        if let Some(label) = stage.progress_label() {
            println!("{}", label);
        }
    }

    fn show_dialogue(&self, dialogue: &str) {
        println!("\n=== Generated Dialogue ===\n{}\n", dialogue);
    }

    fn show_image(&self, image: &DynamicImage) {
        println!("Image ready ({}x{})", image.width(), image.height());
    }

    fn status(&self, message: &str) {
        println!("{}", message);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Stage(Stage),
    Dialogue(String),
    Image { width: u32, height: u32 },
    Status(String),
}

/// Records every display call in order.
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    events: Arc<Mutex<Vec<DisplayEvent>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn get_stages(&self) -> Vec<Stage> {
        self.get_events()
            .into_iter()
            .filter_map(|event| match event {
                DisplayEvent::Stage(stage) => Some(stage),
                _ => None,
            })
            .collect()
    }

    pub fn get_dialogue(&self) -> Option<String> {
        self.get_events().into_iter().rev().find_map(|event| match event {
            DisplayEvent::Dialogue(dialogue) => Some(dialogue),
            _ => None,
        })
    }

    pub fn get_statuses(&self) -> Vec<String> {
        self.get_events()
            .into_iter()
            .filter_map(|event| match event {
                DisplayEvent::Status(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: DisplayEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl DisplaySink for RecordingDisplay {
    fn stage_changed(&self, stage: Stage) {
        self.push(DisplayEvent::Stage(stage));
    }

    fn show_dialogue(&self, dialogue: &str) {
        self.push(DisplayEvent::Dialogue(dialogue.to_string()));
    }

    fn show_image(&self, image: &DynamicImage) {
        self.push(DisplayEvent::Image {
            width: image.width(),
            height: image.height(),
        });
    }

    fn status(&self, message: &str) {
        self.push(DisplayEvent::Status(message.to_string()));
    }
}

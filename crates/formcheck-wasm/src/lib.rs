//! # Formcheck-Wasm
//!
//! JavaScript bridge for running the engine next to an in-browser pose
//! detector. The page pushes one flat `Float32Array` per detection
//! (33 landmarks x `[x, y, z, visibility]`) and gets the frame's evaluation
//! back as JSON.

use formcheck_core::{EngineConfig, ExerciseType, PoseFrame, Timestamp};
use formcheck_engine::SessionAnalyzer;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Exercise identifiers accepted by `FormSession::new`, as a JSON array
#[wasm_bindgen]
pub fn supported_exercises() -> String {
    let names: Vec<_> = ExerciseType::ALL.iter().map(|e| e.as_str()).collect();
    serde_json::Value::from(names).to_string()
}

/// One exercise session held on the JS side
#[wasm_bindgen]
pub struct FormSession {
    analyzer: SessionAnalyzer,
}

#[wasm_bindgen]
impl FormSession {
    #[wasm_bindgen(constructor)]
    pub fn new(exercise: &str) -> Result<FormSession, JsValue> {
        Self::create(exercise).map_err(to_js)
    }

    /// Analyze one detection; returns the `FrameOutcome` as JSON
    #[wasm_bindgen(js_name = pushFrame)]
    pub fn push_frame(&mut self, data: &[f32], timestamp_ms: f64) -> Result<String, JsValue> {
        self.push(data, timestamp_ms).map_err(to_js)
    }

    #[wasm_bindgen(js_name = repCount)]
    pub fn rep_count(&self) -> u32 {
        self.analyzer.rep_count()
    }

    #[wasm_bindgen(js_name = startNewSet)]
    pub fn start_new_set(&mut self) {
        self.analyzer.start_new_set();
    }

    /// Session summary as JSON
    pub fn summary(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.analyzer.summary()).map_err(to_js)
    }

    pub fn reset(&mut self) {
        self.analyzer.reset();
    }
}

impl FormSession {
    fn create(exercise: &str) -> formcheck_core::Result<Self> {
        let exercise: ExerciseType = exercise.parse()?;
        tracing::debug!(%exercise, "form session created");
        Ok(Self {
            analyzer: SessionAnalyzer::new(exercise, &EngineConfig::new()),
        })
    }

    fn push(&mut self, data: &[f32], timestamp_ms: f64) -> formcheck_core::Result<String> {
        let frame = PoseFrame::from_flat(data, Timestamp::from_millis(timestamp_ms as i64))?;
        let outcome = self.analyzer.process(&frame);
        Ok(serde_json::to_string(&outcome)?)
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

//! Note pipeline orchestrator.
//!
//! Builds every stage once from a [`PipelineConfig`] and [`RuleTables`],
//! then annotates notes. A built pipeline is immutable and `Send + Sync`;
//! share it behind an `Arc` to annotate notes from several threads.

use super::context::ContextClassifier;
use super::postprocess::{Postprocessor, SentenceView};
use super::preprocess::Preprocessor;
use super::rule_tables::RuleTables;
use super::sectionizer::{section_of_sentences, Sectionizer};
use super::segment::Segmenter;
use super::serialize::{to_records, EntityRecord, NoteResult};
use super::target::{EntityRecognizer, EntitySource, TargetMatcher};
use super::tokenize::tokenize;
use super::types::{Entity, Section, SentenceUnit, Span};
use super::ConfigError;
use crate::models::Note;
use crate::pipeline_config::PipelineConfig;

/// Where entities come from. Exactly one source per pipeline.
pub enum TargetMode {
    /// Match the rule table's target phrases.
    Rules,
    /// Delegate to an external recognizer; the target table is ignored.
    Model(Box<dyn EntityRecognizer>),
}

/// Intermediate results for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedNote {
    /// Normalized note text.
    pub text: String,
    pub sentences: Vec<SentenceUnit>,
    pub sections: Vec<Section>,
    pub entities: Vec<Entity>,
}

impl AnnotatedNote {
    pub fn records(&self) -> Vec<EntityRecord> {
        to_records(&self.entities, &self.sentences, &self.sections)
    }
}

#[derive(Debug)]
pub struct NotePipeline {
    preprocessor: Preprocessor,
    segmenter: Segmenter,
    sectionizer: Sectionizer,
    source: EntitySource,
    context: ContextClassifier,
    postprocessor: Postprocessor,
}

impl NotePipeline {
    /// Validate configuration and compile every rule table. Any error here
    /// is raised before a single note is processed.
    pub fn new(config: &PipelineConfig, tables: &RuleTables, mode: TargetMode) -> Result<Self, ConfigError> {
        config.validate()?;
        let source = match mode {
            TargetMode::Rules => EntitySource::Rules(TargetMatcher::new(&tables.targets)?),
            TargetMode::Model(recognizer) => EntitySource::Model(recognizer),
        };
        let pipeline = Self {
            preprocessor: Preprocessor::new(&tables.preprocess, &config.segmenter)?,
            segmenter: Segmenter::new(&config.segmenter)?,
            sectionizer: Sectionizer::new(&tables.sections)?,
            source,
            context: ContextClassifier::new(&tables.context_rules(), &config.context)?,
            postprocessor: Postprocessor::new(&tables.postprocess)?,
        };
        tracing::info!(
            preprocess = pipeline.preprocessor.len(),
            context = pipeline.context.len(),
            postprocess = pipeline.postprocessor.len(),
            source = %pipeline.source.describe(),
            "Note pipeline ready"
        );
        Ok(pipeline)
    }

    /// Rule-mode pipeline with default settings and built-in tables.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(&PipelineConfig::default(), &RuleTables::builtin(), TargetMode::Rules)
    }

    /// Run every stage over raw note text. Never fails: an empty note
    /// yields no sentences and no entities.
    pub fn analyze(&self, raw: &str) -> AnnotatedNote {
        // Step 1: normalize
        let text = self.preprocessor.apply(raw);

        // Step 2: segment and sectionize
        let segmentation = self.segmenter.segment(&text);
        let sections = self.sectionizer.assign(&segmentation);
        let sentences = segmentation.into_sentences();
        let owners = section_of_sentences(&sections, sentences.len());
        let tokens: Vec<Vec<Span>> = sentences.iter().map(|s| tokenize(&s.text)).collect();

        // Step 3: targets and context, sentence by sentence
        let mut entities = Vec::new();
        for (sentence, sentence_tokens) in sentences.iter().zip(&tokens) {
            let mut found: Vec<Entity> = self
                .source
                .find(&sentence.text, sentence_tokens)
                .into_iter()
                .map(|m| Entity::new(m.text, m.label, m.span, sentence.index, owners[sentence.index]))
                .collect();
            if found.is_empty() {
                continue;
            }
            self.context.classify(&sentence.text, sentence_tokens, &mut found);
            entities.append(&mut found);
        }
        let found = entities.len();

        // Step 4: post-process
        let view = SentenceView {
            sentences: &sentences,
            tokens: &tokens,
        };
        let entities = self.postprocessor.apply(entities, view);

        tracing::debug!(
            sentences = sentences.len(),
            sections = sections.len(),
            found,
            kept = entities.len(),
            "Note analyzed"
        );

        AnnotatedNote {
            text,
            sentences,
            sections,
            entities,
        }
    }

    /// Entity records for raw note text.
    pub fn annotate_text(&self, raw: &str) -> Vec<EntityRecord> {
        self.analyze(raw).records()
    }

    /// Annotate one note, keeping its visit id and date.
    pub fn annotate(&self, note: &Note) -> NoteResult {
        let _span = tracing::info_span!("annotate_note", visit_id = %note.visit_id).entered();
        let analyzed = self.analyze(&note.text);
        let entities = analyzed.records();
        NoteResult {
            csn: note.visit_id.clone(),
            date: note.date,
            text: analyzed.text,
            entities,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

//! Service layer: the tournament engine and the pipeline around it.

pub mod batch_partitioner;
pub mod judging_instruction;
pub mod pic_search_service;
pub mod result_finalizer;
pub mod round_executor;
pub mod tournament_engine;
pub mod verdict_parser;

pub use batch_partitioner::{batch_count, partition};
pub use judging_instruction::{effective_instruction, escalation_for};
pub use pic_search_service::{PicSearchService, SearchReport};
pub use result_finalizer::ResultFinalizer;
pub use round_executor::{RoundExecutor, RoundExecutorConfig, RoundOutcome};
pub use tournament_engine::TournamentEngine;
pub use verdict_parser::{parse_verdict, ParseStrategy, ParsedVerdict, SELECTION_FIELD};

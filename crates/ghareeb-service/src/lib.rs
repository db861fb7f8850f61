pub mod handlers;
pub mod lookup;
pub mod matcher;
pub mod report;
pub mod validator;

pub use handlers::{ApiError, AppState, router};
pub use lookup::{PageGlosses, glosses_for_page};
pub use matcher::{
    Candidate, LineMatches, Segment, UsedKeys, match_line, match_page, prepare_candidates,
    segment_line,
};
pub use report::{CSV_BOM, CSV_HEADER, to_csv, to_json};
pub use validator::{
    AggressiveMatch, AlefDroppedMatch, Evidence, ExactMatch, MatchStrategy, PreparedPage,
    PreparedWord, RootMatch, Validator, validate,
};

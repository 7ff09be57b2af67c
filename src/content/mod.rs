//! Release-notes enrichment.
//!
//! Items that ship without inline notes but link to a release-notes page get
//! that page's body as their description.

mod release_notes;

pub use release_notes::{
    enrich, fetch_release_notes, EnrichOptions, EnrichReport, FailurePolicy, NoteFailure,
    NotesError,
};

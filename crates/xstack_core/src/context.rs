//! Run context passed down through every stage.

use crate::diagnostics::Diagnostics;
use crate::mappings::MappingTable;
use crate::settings::RunSettings;

/// State owned by a single run: settings, the lookup mapping table and the
/// diagnostics sink.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub settings: RunSettings,
    pub mappings: MappingTable,
    pub diagnostics: Diagnostics,
}

impl RunContext {
    pub fn new(settings: RunSettings) -> Self {
        Self {
            settings,
            mappings: MappingTable::new(),
            diagnostics: Diagnostics::new(),
        }
    }
}

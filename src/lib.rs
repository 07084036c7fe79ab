/*!
# Grid View Engine

The record query and presentation engine behind a no-code table/grid app.

## Overview

Every grid view shows one table of records through a configurable lens:
search text, filter conditions, an optional grouping field, an optional
sort, hidden fields and row colouring. This crate holds that configuration
and turns a record set into the rows a grid renders. Everything runs in
memory and synchronously; there is no server and no database.

## Pipeline

```text
records -> search text -> filter set -> group by -> sort within groups
                                                       |
                                         colour rules (presentation only)
```

- **Search** keeps records where any value contains the query
  (case-insensitive).
- **Filter set** ANDs its conditions. A condition whose value cannot be
  compared (say `progress > "lots"`) is skipped for the pass and reported,
  so one bad condition never blanks the grid.
- **Grouping** partitions by a field's text, in first-seen key order.
- **Sorting** is stable and applies inside each group only.
- **Colouring** maps a record to a background/text colour by status,
  priority or user rules (first match wins).

## Modules

- **field**: Field registry and the operators each semantic type accepts
- **record**: Records and typed values
- **filter**: Conditions, predicate evaluation, filter set, search
- **grouping**: Grouping, per-group sorting, opt-in group ordering
- **coloring**: Palettes, colour rules, `color_for`
- **view**: The view state every render reads
- **pipeline**: One full pass from records to a projection
- **source**: Record ownership with add/delete hooks
- **saving**: JSON blob stores and debounced autosave
- **loader**: JSON and CSV record import
- **error**: Error types

## Usage

```
use gridview::{EvalContext, FieldRegistry, Record, ViewState, project};

let registry = FieldRegistry::standard();
let records = vec![
    Record::new("1").with("status", "Pending").with("priority", "High"),
    Record::new("2").with("status", "Approved").with("priority", "Low"),
];

let mut view = ViewState::new();
view.add_quick_filter("status", "Approved");

let projection = project(&view, &records, &registry, &EvalContext::default()).unwrap();
assert_eq!(projection.matched(), 1);
```
*/

pub mod coloring;
pub mod error;
pub mod field;
pub mod filter;
pub mod grouping;
pub mod loader;
pub mod pipeline;
pub mod record;
pub mod saving;
pub mod source;
pub mod view;

/// Re-export the commonly used types to make the crate easier to use
pub use coloring::{ColorConfig, ColorMode, ColorRule, Palette, RowColor, RuleCondition, color_for};
pub use error::{Result, ViewError};
pub use field::{FieldDescriptor, FieldRegistry, FieldType};
pub use filter::{
    EvalContext, FilterCondition, FilterOutcome, FilterSet, FilterValue, FilterWarning, Operator,
    apply_filters, matches, search_records,
};
pub use grouping::{
    Group, GroupOrder, GroupedRecords, SortDirection, SortSpec, UNGROUPED, group_by, order_groups,
    sort_groups,
};
pub use pipeline::{Projection, ProjectionStatus, project};
pub use record::{Record, Value};
pub use saving::{Autosave, BlobStore, FileStore, MemoryStore, load_view_state, save_view_state};
pub use source::RecordStore;
pub use view::ViewState;

// Core search logic exports
pub mod care_type;
pub mod distance;
pub mod filters;
pub mod rating;
pub mod search;

pub use care_type::{convert_field_backward, convert_field_forward, CareType};
pub use distance::{calculate_bounding_box, great_circle_distance, is_close_enough, is_within_bounding_box};
pub use filters::{birthday_in_range, matches_attributes, passes_plan_gate, speaks_any, visible_to, AttributeFilters};
pub use rating::total_rating;
pub use search::{DistanceFilter, FamilleQuery, OrderBy, PrestataireQuery, ProfileQuery, SearchEngine, SearchOutcome, SearchSettings};

pub mod geo;
pub mod labels;
pub mod selection;


pub use geo::{haversine_miles, km_to_miles, EARTH_RADIUS_MILES};
pub use labels::{parse_ambulance_tier, parse_care_categories, strip_code_fence};
pub use selection::{
    select, BestRatedStrategy, CollaboratorOrderStrategy, NearestOfTierStrategy, SelectionPolicy,
    SelectionStrategy,
};

pub mod comparisons;
pub use comparisons::{ComparisonError, ComparisonService};

pub mod distance;
pub use distance::RankedResult;

pub mod filters;
pub use filters::{Filters, SupportNeeds};

pub mod geocoding;
pub use geocoding::{GeocodeError, GeocodingService};

pub mod search;
pub use search::{SearchError, SearchService};

pub mod transport;
pub use transport::{SchoolBusSchedule, TransportEstimate, TransportMode};

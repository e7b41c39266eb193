pub mod nominatim;

pub use nominatim::{GeocodeProvider, NominatimClient, ProviderError};

pub mod checkpoint;
pub mod chunk;
pub mod clock;
pub mod constants;
pub mod gearbox;
pub mod police;
pub mod station;
pub mod streaming;
pub mod traffic;
pub mod vehicle;

pub use checkpoint::*;
pub use chunk::*;
pub use clock::*;
pub use constants::*;
pub use gearbox::*;
pub use police::*;
pub use station::*;
pub use streaming::*;
pub use traffic::*;
pub use vehicle::*;

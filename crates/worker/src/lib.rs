pub mod actor;
pub mod assessors;
pub mod registry;
pub mod resolver;

pub use actor::{spawn_resolver, ResolverActor, ResolverHandle, ResolverMessage};
pub use assessors::{
    AmbulanceTierAssessor, Assessed, Assessor, CareCategoryAssessor, DirectoryOrderAssessor,
};
pub use registry::{build_resolvers, ResolverDependencies, ResolverRegistry};
pub use resolver::{FacilityResolver, ResolverSettings};

pub mod deployment_plan;
pub mod plan_builder;

pub use deployment_plan::{DeploymentPlan, PlannedGroup};
pub use plan_builder::PlanBuilder;

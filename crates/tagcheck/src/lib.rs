//! # tagcheck - static tag compliance for terraform sources
//!
//! ## Introduction for developers
//!
//! Read this to understand how `tagcheck` works internally.
//!
//! ### Terraform terms
//!
//! Quick introduction to the parts of a terraform tree `tagcheck` cares about.
//!
//! ```hcl
//! variable "environment" {
//!   default = "dev"
//! }
//!
//! locals {
//!   name_prefix = "${var.project}-${var.environment}"
//!   common_tags = { Environment = var.environment }
//! }
//!
//! resource "aws_instance" "web" {
//!   tags = {
//!     Name        = "${local.name_prefix}-web"
//!     Environment = var.environment
//!   }
//! }
//! ```
//!
//! - a `variable` has a declared default and may get a value from the environment (`TF_VAR_*`),
//!   a values file (`terraform.tfvars`, `*.auto.tfvars`) or an explicit override
//! - a `local` is an expression over variables, other locals and functions
//! - a `resource` carries its tags in an attribute, `tags` or `labels` depending on the provider
//!
//! ### Loading
//!
//! [hcl_documents::HclDocuments] holds every `.tf` and `.tf.json` document of a tree with its
//! source path and text (for line numbers). At this point the documents only have to be valid HCL
//! or JSON to be accepted. A file that fails to parse is skipped and reported as a
//! [hcl_documents::FileDiagnostic].
//!
//! [declarations::Declarations] extracts variables and locals, [value_store::ValueStore] collects
//! variable values with their precedence.
//!
//! ### Resolution
//!
//! Locals may reference each other in any order. [dependency::resolve_all] evaluates them in
//! repeated passes until nothing changes anymore, rebuilding the [context::EvalContext] after every
//! resolved local. Locals that cannot be resolved (missing variables, cycles, unsupported
//! functions) stay unresolved, they never abort anything.
//!
//! Evaluation itself is done by [hcl::eval] through the [expression::Expression] trait, with the
//! terraform function library from [functions] declared in the context.
//!
//! [resolver::VariableResolver] ties the above together and answers
//! [resolver::VariableResolver::resolve_reference] for tag values such as `var.environment`,
//! `local.sizes["prod"]` or `"${local.name_prefix}-web"`.
//!
//! ### Validation
//!
//! A [standard::TagStandard] lists required and optional tags with their constraints, plus
//! resource rules that adjust the tag sets per resource type. [validator::Validator] checks the
//! tags of each resource found by [resources::extract] and produces a
//! [validator::ValidationResult] with violations and suggested fixes. [report::create_report]
//! folds the results into summary statistics.
//!
//! ### Output
//!
//! All results are plain [serde] structures, the CLI writes them as YAML or JSON.
//!
pub mod capability;
pub mod constraints;
pub mod context;
pub mod declarations;
pub mod dependency;
pub mod expression;
pub mod functions;
pub mod hcl_documents;
pub mod report;
pub mod resolver;
pub mod resources;
pub mod standard;
mod util;
pub mod validator;
pub mod value;
pub mod value_store;
mod visit;

pub mod manifests;
pub mod reorganize;

pub use manifests::{merge_manifests, ManifestReport, MergedManifest};
pub use reorganize::{
    check_root, plan_reorganization, reorganize_pack, PlannedTransfer, RelocatedFile,
    ReorganizationPlan, ReorganizeConfig, ReorganizeReport, TransferError,
};

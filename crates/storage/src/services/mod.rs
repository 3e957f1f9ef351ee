pub mod noshow_policy;

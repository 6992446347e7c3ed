pub mod asset_suppressor;

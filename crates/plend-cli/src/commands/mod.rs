pub mod compare;
pub mod composites;
pub mod correlate;
pub mod describe;
pub mod dispatch;
pub mod factor;
pub mod mediate;
pub mod plot;
pub mod regress;
pub mod run;
pub mod schema;
pub mod shared;

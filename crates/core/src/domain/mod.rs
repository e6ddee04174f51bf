pub mod company;
pub mod contract;
pub mod financial;
pub mod pipeline;

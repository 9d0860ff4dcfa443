pub mod defined_ident_collector;
pub mod pure_checker;
pub mod reference_collector;

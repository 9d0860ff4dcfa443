pub mod logger;
#[cfg(test)]
pub(crate) mod test_helper;
pub mod thread_pool;

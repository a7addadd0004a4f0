pub(crate) mod assignment;
pub(crate) mod ids;
pub(crate) mod template;

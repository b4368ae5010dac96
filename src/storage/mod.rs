mod in_memory;
mod on_disk;

pub(crate) use in_memory::InMemoryStorage;
pub(crate) use on_disk::OnDiskStorage;

//! The `hyperdexd shard` inspection command (spec §6 AMBIENT note):
//! a read-only dump of a shard file's header geometry and live record
//! count, grounded in `tools/state-viewer`'s offline, read-only
//! inspection commands — it never mutates the file it opens.

use crate::cli::ShardArgs;
use hyperdex_store::{Header, Shard};

pub fn run(args: ShardArgs) -> anyhow::Result<()> {
    let shard = Shard::open(&args.path)?;
    let config = shard.config();
    let live_records = shard.snapshot().count();

    println!("path:                 {}", args.path.display());
    println!("magic:                {:?}", std::str::from_utf8(&Header::MAGIC).unwrap_or("<invalid>"));
    println!("format_version:       {}", Header::FORMAT_VERSION);
    println!("hash_table_entries:   {}", config.hash_table_entries);
    println!("search_index_entries: {}", config.search_index_entries);
    println!("data_segment_size:    {}", config.data_segment_size);
    println!("total_file_size:      {}", config.total_file_size());
    println!("live_records:         {live_records}");
    Ok(())
}

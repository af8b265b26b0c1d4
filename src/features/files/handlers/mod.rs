pub mod file_handler;

pub use file_handler::{
    __path_download_file, __path_list_files, __path_search_by_content, __path_search_by_metadata,
    __path_search_by_tags, __path_update_metadata, __path_upload_file, download_file, list_files,
    search_by_content, search_by_metadata, search_by_tags, update_metadata, upload_file, FilesState,
};

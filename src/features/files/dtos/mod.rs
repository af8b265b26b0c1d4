mod file_dto;

pub use file_dto::{
    parse_metadata, parse_tags, ContentSearchQuery, FileResponseDto, MetadataSearchQuery,
    TagSearchQuery, UpdateFileMetadataDto,
};

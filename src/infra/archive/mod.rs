pub mod fs_ticket_archive;

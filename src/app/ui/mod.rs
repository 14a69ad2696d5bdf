mod controls;
mod details;
mod editor;
mod fps;
mod panels;
